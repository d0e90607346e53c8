//! 작업(Job) trait -- 외부 스케줄러와의 계약
//!
//! 스케줄러는 작업 유형별로 [`JobPolicy`]를 조회해 동시 실행 수와 재시도 횟수를
//! 결정하고, [`Job::validate`]로 파라미터를 미리 검사한 뒤 [`Job::run`]을 호출합니다.
//! 재시도 루프와 동시성 제한은 스케줄러의 책임이며 작업 구현은 정책만 선언합니다.
//!
//! # 생명주기
//! ```text
//! Scheduled → validate() → run() → Succeeded | Failed → (retry ≤ max_fails)
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ScandataError;

/// 스케줄러가 전달하는 호출 파라미터 (key/value 맵)
pub type JobParameters = serde_json::Map<String, serde_json::Value>;

/// 작업 유형이 스케줄러에 선언하는 실행 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPolicy {
    /// 실패 시 허용되는 최대 재시도 횟수
    pub max_fails: u32,
    /// 클러스터 전체에서 동시에 활성화될 수 있는 실행 수 (0 = 무제한)
    pub max_concurrency: u32,
    /// 실패 후 재시도 여부
    pub should_retry: bool,
}

/// 스케줄러가 실행하는 작업 trait
///
/// # 구현 예시
/// ```ignore
/// struct NoopJob;
///
/// impl Job for NoopJob {
///     type Output = ();
///
///     fn name(&self) -> &str { "NOOP" }
///     fn max_fails(&self) -> u32 { 0 }
///     fn max_concurrency(&self) -> u32 { 0 }
///     fn should_retry(&self) -> bool { false }
///     fn validate(&self, _params: &JobParameters) -> Result<(), ScandataError> { Ok(()) }
///     async fn run(&self, _params: &JobParameters) -> Result<(), ScandataError> { Ok(()) }
/// }
/// ```
pub trait Job: Send + Sync {
    /// 성공 시 반환하는 결과 타입
    type Output: Send;

    /// 작업 유형 이름
    fn name(&self) -> &str;

    /// 실패 시 허용되는 최대 재시도 횟수
    fn max_fails(&self) -> u32;

    /// 동시에 활성화될 수 있는 실행 수 (0 = 무제한)
    fn max_concurrency(&self) -> u32;

    /// 실패한 실행을 재시도할지 여부
    fn should_retry(&self) -> bool;

    /// 파라미터 유효성을 검사합니다.
    ///
    /// 스케줄러는 작업을 큐에 넣기 전에 호출하여 잘못된 호출을 조기에 거부합니다.
    fn validate(&self, params: &JobParameters) -> Result<(), ScandataError>;

    /// 작업을 실행합니다.
    fn run(
        &self,
        params: &JobParameters,
    ) -> impl Future<Output = Result<Self::Output, ScandataError>> + Send;

    /// 선언된 정책을 하나의 값으로 반환합니다.
    fn policy(&self) -> JobPolicy {
        JobPolicy {
            max_fails: self.max_fails(),
            max_concurrency: self.max_concurrency(),
            should_retry: self.should_retry(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;

    struct EchoJob;

    impl Job for EchoJob {
        type Output = usize;

        fn name(&self) -> &str {
            "ECHO"
        }

        fn max_fails(&self) -> u32 {
            2
        }

        fn max_concurrency(&self) -> u32 {
            0
        }

        fn should_retry(&self) -> bool {
            false
        }

        fn validate(&self, params: &JobParameters) -> Result<(), ScandataError> {
            if params.contains_key("mode") {
                Ok(())
            } else {
                Err(JobError::InvalidParameters("mode missing".to_owned()).into())
            }
        }

        async fn run(&self, params: &JobParameters) -> Result<usize, ScandataError> {
            self.validate(params)?;
            Ok(params.len())
        }
    }

    #[test]
    fn policy_collects_declared_values() {
        let policy = EchoJob.policy();
        assert_eq!(
            policy,
            JobPolicy {
                max_fails: 2,
                max_concurrency: 0,
                should_retry: false,
            }
        );
    }

    #[tokio::test]
    async fn run_uses_parameters() {
        let mut params = JobParameters::new();
        params.insert("mode".to_owned(), serde_json::json!("export"));
        assert_eq!(EchoJob.run(&params).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn run_rejects_missing_mode() {
        let err = EchoJob.run(&JobParameters::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ScandataError::Job(JobError::InvalidParameters(_))
        ));
    }
}
