#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, JobError, ScandataError, StorageError};

// 설정
pub use config::ScandataConfig;

// 작업 trait
pub use job::{Job, JobParameters, JobPolicy};

// 도메인 타입
pub use types::ExecutionId;
