//! 에러 타입 -- 도메인별 에러 정의

/// scandata 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScandataError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 작업(Job) 실행 에러
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// 외부 저장소/백엔드 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 작업 실행 에러
///
/// 스케줄러는 이 에러를 작업 결과로 기록하고 재시도 여부를 결정합니다.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// 호출 파라미터가 없거나 형식이 잘못됨
    #[error("invalid job parameters: {0}")]
    InvalidParameters(String),

    /// 특정 단계에서 작업 실패
    #[error("job failed at {stage}: {reason}")]
    Failed { stage: String, reason: String },
}

/// 외부 협력자(필터, 데이터 소스, 아티팩트/실행 저장소) 에러
///
/// 모든 협력자 trait은 이 타입으로 실패를 보고합니다.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 대상 레코드 없음
    #[error("not found: {0}")]
    NotFound(String),

    /// 저장 용량 부족
    #[error("storage capacity exceeded: {0}")]
    Capacity(String),

    /// 백엔드 I/O 에러
    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),
}
