//! 도메인 타입 -- 크레이트 간에 공유되는 식별자

use std::fmt;

use serde::{Deserialize, Serialize};

/// 실행 레코드 식별자
///
/// 스케줄러가 작업을 호출할 때 `JobId` 파라미터로 전달하며,
/// 같은 값이 실행 레코드 조회 키로 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub i64);

impl ExecutionId {
    /// 내부 정수 값을 반환합니다.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ExecutionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
