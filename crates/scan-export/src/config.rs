//! 내보내기 설정
//!
//! [`ExportConfig`]는 core의 [`ExportSection`](scandata_core::config::ExportSection)에서
//! 파생되며, 내보내기 파이프라인이 사용하는 값을 검증된 형태로 보관합니다.
//!
//! # 사용 예시
//!
//! ```
//! use scandata_export::{ExportConfig, ExportConfigBuilder};
//!
//! let config = ExportConfig::default();
//! config.validate().unwrap();
//!
//! let config = ExportConfigBuilder::new()
//!     .export_dir("/tmp/exports")
//!     .query_page_size(500)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.query_page_size, 500);
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// 한 번의 조회에 포함할 수 있는 최대 아티팩트 ID 수
const MAX_ARTIFACT_GROUP_SIZE: usize = 100_000;
/// 페이지당 최대 조회 행 수
const MAX_QUERY_PAGE_SIZE: usize = 1_000_000;
/// 경로 길이 상한
const MAX_PATH_LEN: usize = 4096;

/// 스캔 데이터 내보내기 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// 임시 CSV 파일 디렉토리
    pub export_dir: PathBuf,
    /// 배치당 아티팩트 ID 수
    pub artifact_group_size: usize,
    /// 페이지당 조회 행 수
    pub query_page_size: usize,
    /// 시스템 아티팩트 유형 태그
    pub artifact_type: String,
    /// 시스템 아티팩트 벤더 태그 (등록 시 소문자로 변환)
    pub vendor: String,
    /// 실행 레코드 extra attrs 다이제스트 키
    pub digest_key: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::from_core(&scandata_core::config::ExportSection::default())
    }
}

impl ExportConfig {
    /// core의 `ExportSection`에서 내보내기 설정을 생성합니다.
    pub fn from_core(core: &scandata_core::config::ExportSection) -> Self {
        Self {
            export_dir: PathBuf::from(&core.export_dir),
            artifact_group_size: core.artifact_group_size,
            query_page_size: core.query_page_size,
            artifact_type: core.artifact_type.clone(),
            vendor: core.vendor.clone(),
            digest_key: core.digest_key.clone(),
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `artifact_group_size`: 1-100000
    /// - `query_page_size`: 1-1000000
    /// - `export_dir`: 비어있지 않고 `..` 컴포넌트가 없어야 함
    /// - `artifact_type`, `vendor`, `digest_key`: 비어있으면 안 됨
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.artifact_group_size == 0 || self.artifact_group_size > MAX_ARTIFACT_GROUP_SIZE {
            return Err(ExportError::Config {
                field: "artifact_group_size".to_owned(),
                reason: format!("must be 1-{MAX_ARTIFACT_GROUP_SIZE}"),
            });
        }

        if self.query_page_size == 0 || self.query_page_size > MAX_QUERY_PAGE_SIZE {
            return Err(ExportError::Config {
                field: "query_page_size".to_owned(),
                reason: format!("must be 1-{MAX_QUERY_PAGE_SIZE}"),
            });
        }

        validate_dir(&self.export_dir)?;

        for (field, value) in [
            ("artifact_type", &self.artifact_type),
            ("vendor", &self.vendor),
            ("digest_key", &self.digest_key),
        ] {
            if value.trim().is_empty() {
                return Err(ExportError::Config {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

fn validate_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.as_os_str().is_empty() {
        return Err(ExportError::Config {
            field: "export_dir".to_owned(),
            reason: "must not be empty".to_owned(),
        });
    }

    if dir.components().any(|c| c == Component::ParentDir) {
        return Err(ExportError::Config {
            field: "export_dir".to_owned(),
            reason: format!(
                "'{}' contains path traversal pattern '..'",
                dir.display()
            ),
        });
    }

    if dir.as_os_str().len() > MAX_PATH_LEN {
        return Err(ExportError::Config {
            field: "export_dir".to_owned(),
            reason: format!("exceeds maximum length {MAX_PATH_LEN}"),
        });
    }

    Ok(())
}

/// [`ExportConfig`] 빌더
///
/// 빌드 시 유효성 검증을 수행합니다.
#[derive(Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 임시 파일 디렉토리를 설정합니다.
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = dir.into();
        self
    }

    /// 배치당 아티팩트 ID 수를 설정합니다.
    pub fn artifact_group_size(mut self, size: usize) -> Self {
        self.config.artifact_group_size = size;
        self
    }

    /// 페이지당 조회 행 수를 설정합니다.
    pub fn query_page_size(mut self, size: usize) -> Self {
        self.config.query_page_size = size;
        self
    }

    /// 시스템 아티팩트 유형 태그를 설정합니다.
    pub fn artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.config.artifact_type = artifact_type.into();
        self
    }

    /// 시스템 아티팩트 벤더 태그를 설정합니다.
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.config.vendor = vendor.into();
        self
    }

    /// 다이제스트 키를 설정합니다.
    pub fn digest_key(mut self, key: impl Into<String>) -> Self {
        self.config.digest_key = key.into();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ExportError::Config` 반환
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
