//! 설정 관리 -- scandata.toml 파싱 및 런타임 설정
//!
//! [`ScandataConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SCANDATA_EXPORT_DIR=/data/exports` 형식)
//! 3. 설정 파일 (`scandata.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scandata_core::error::ScandataError> {
//! use scandata_core::config::ScandataConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScandataConfig::load("scandata.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScandataConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ScandataError};

/// scandata 통합 설정
///
/// `scandata.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScandataConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 데이터 내보내기 설정
    #[serde(default)]
    pub export: ExportSection,
    /// 로컬 백엔드 저장소 설정
    #[serde(default)]
    pub storage: StorageSection,
}

impl ScandataConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScandataError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScandataError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScandataError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScandataError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScandataError> {
        toml::from_str(toml_str).map_err(|e| {
            ScandataError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCANDATA_{SECTION}_{FIELD}`
    /// 예: `SCANDATA_EXPORT_QUERY_PAGE_SIZE=5000`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SCANDATA_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANDATA_GENERAL_LOG_FORMAT");

        // Export
        override_string(&mut self.export.export_dir, "SCANDATA_EXPORT_DIR");
        override_usize(
            &mut self.export.artifact_group_size,
            "SCANDATA_EXPORT_ARTIFACT_GROUP_SIZE",
        );
        override_usize(
            &mut self.export.query_page_size,
            "SCANDATA_EXPORT_QUERY_PAGE_SIZE",
        );
        override_string(&mut self.export.artifact_type, "SCANDATA_EXPORT_ARTIFACT_TYPE");
        override_string(&mut self.export.vendor, "SCANDATA_EXPORT_VENDOR");
        override_string(&mut self.export.digest_key, "SCANDATA_EXPORT_DIGEST_KEY");

        // Storage
        override_string(&mut self.storage.dataset_path, "SCANDATA_STORAGE_DATASET_PATH");
        override_string(
            &mut self.storage.artifact_store_dir,
            "SCANDATA_STORAGE_ARTIFACT_STORE_DIR",
        );
        override_string(
            &mut self.storage.execution_store_path,
            "SCANDATA_STORAGE_EXECUTION_STORE_PATH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 내보내기 세부 범위 검증은 `scandata-export`의 `ExportConfig::validate`가 담당합니다.
    pub fn validate(&self) -> Result<(), ScandataError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.export.export_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.export_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.export.artifact_group_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.artifact_group_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.export.query_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.query_page_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 스캔 데이터 내보내기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// 임시 CSV 파일을 생성할 디렉토리
    pub export_dir: String,
    /// 한 번의 조회에 포함할 최대 아티팩트 ID 수
    pub artifact_group_size: usize,
    /// 페이지당 조회 행 수
    pub query_page_size: usize,
    /// 시스템 아티팩트 유형 태그
    pub artifact_type: String,
    /// 시스템 아티팩트 벤더 태그 (저장 시 소문자 변환)
    pub vendor: String,
    /// 실행 레코드 extra attrs에 기록할 다이제스트 키
    pub digest_key: String,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            export_dir: "/var/scandata_exports".to_owned(),
            artifact_group_size: 10_000,
            query_page_size: 100_000,
            artifact_type: "ScanData_CSV".to_owned(),
            vendor: "SCAN_DATA_EXPORT".to_owned(),
            digest_key: "artifact_digest".to_owned(),
        }
    }
}

/// 로컬 백엔드 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// 스캔 데이터셋 JSON 파일 경로
    pub dataset_path: String,
    /// 콘텐츠 주소 기반 아티팩트 저장소 디렉토리
    pub artifact_store_dir: String,
    /// 실행 레코드 JSON 파일 경로
    pub execution_store_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            dataset_path: "/var/lib/scandata/dataset.json".to_owned(),
            artifact_store_dir: "/var/lib/scandata/artifacts".to_owned(),
            execution_store_path: "/var/lib/scandata/executions.json".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
