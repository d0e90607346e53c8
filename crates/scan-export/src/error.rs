//! 스캔 데이터 내보내기 에러 타입
//!
//! [`ExportError`]는 내보내기 파이프라인의 각 단계에서 발생할 수 있는 모든 실패를 나타냅니다.
//! `From<ExportError> for ScandataError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **호출 파라미터**: `InvalidInvocation`
//! - **필터 해석**: `FilterResolution`
//! - **데이터 조회**: `Retrieval`
//! - **CSV 기록**: `Serialization`
//! - **다이제스트 계산**: `Fingerprint`, `InvalidDigest`
//! - **아티팩트 등록**: `Persistence`
//! - **실행 레코드 갱신**: `Annotation`
//! - **설정 / 파일 I/O**: `Config`, `Io`

use std::fmt;

use scandata_core::error::{ConfigError, JobError, ScandataError, StorageError};
use scandata_core::types::ExecutionId;

/// 필터 해석 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// 프로젝트 해석
    Projects,
    /// 리포지토리 해석
    Repositories,
    /// 태그 기반 아티팩트 해석
    Tags,
    /// 라벨 기반 아티팩트 필터링
    Labels,
}

impl FilterStage {
    /// 로그/메트릭에 사용하는 단계 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Repositories => "repositories",
            Self::Tags => "tags",
            Self::Labels => "labels",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 내보내기 도메인 에러
///
/// 어떤 변형이든 스케줄러에는 작업 실패로 보고되며, 재시도 여부는 작업 정책이 결정합니다.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 호출 파라미터가 없거나 형식이 잘못됨
    #[error("invalid invocation: {param}: {reason}")]
    InvalidInvocation {
        /// 문제가 된 파라미터 키
        param: String,
        /// 거부 사유
        reason: String,
    },

    /// 필터 해석 실패
    #[error("filter resolution failed at {stage} stage: {source}")]
    FilterResolution {
        /// 실패한 해석 단계
        stage: FilterStage,
        /// 협력자 에러
        source: StorageError,
    },

    /// 스캔 데이터 페이지 조회 실패
    #[error("retrieval failed for batch {batch} page {page}: {source}")]
    Retrieval {
        /// 배치 인덱스 (0부터)
        batch: usize,
        /// 페이지 번호 (1부터)
        page: u32,
        /// 협력자 에러
        source: StorageError,
    },

    /// CSV 행 인코딩 또는 파일 기록 실패
    #[error("serialization failed: {path}: {source}")]
    Serialization {
        /// 내보내기 파일 경로
        path: String,
        /// 원본 에러
        source: csv::Error,
    },

    /// 다이제스트 계산 실패
    #[error("fingerprint failed: {path}: {source}")]
    Fingerprint {
        /// 내보내기 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 다이제스트 문자열 형식 오류
    #[error("invalid content digest: '{0}'")]
    InvalidDigest(String),

    /// 시스템 아티팩트 등록 실패
    #[error("persistence failed for repository '{repository}': {source}")]
    Persistence {
        /// 등록하려던 리포지토리 이름
        repository: String,
        /// 협력자 에러
        source: StorageError,
    },

    /// 실행 레코드 조회 또는 갱신 실패
    #[error("annotation failed for execution {execution_id}: {source}")]
    Annotation {
        /// 실행 레코드 ID
        execution_id: ExecutionId,
        /// 협력자 에러
        source: StorageError,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl ExportError {
    /// 실패 단계 이름 (메트릭 `stage` 레이블 값)
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInvocation { .. } => "invocation",
            Self::FilterResolution { .. } => "filter",
            Self::Retrieval { .. } => "retrieve",
            Self::Serialization { .. } => "serialize",
            Self::Fingerprint { .. } | Self::InvalidDigest(_) => "fingerprint",
            Self::Persistence { .. } => "persist",
            Self::Annotation { .. } => "annotate",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    pub(crate) fn invalid(param: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInvocation {
            param: param.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<ExportError> for ScandataError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidInvocation { param, reason } => {
                ScandataError::Job(JobError::InvalidParameters(format!("{param}: {reason}")))
            }
            ExportError::Config { field, reason } => {
                ScandataError::Config(ConfigError::InvalidValue { field, reason })
            }
            ExportError::Io { path, source } => ScandataError::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
            other => {
                let stage = other.stage().to_owned();
                ScandataError::Job(JobError::Failed {
                    stage,
                    reason: other.to_string(),
                })
            }
        }
    }
}
