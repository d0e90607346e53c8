//! 로컬 파일 기반 협력자 구현
//!
//! 외부 데이터베이스 없이 내보내기 작업을 실행할 수 있도록 JSON 파일과 디렉토리로
//! 협력자 trait을 구현합니다. CLI와 통합 테스트가 사용합니다.
//!
//! - [`ScanDataset`]: 프로젝트/리포지토리/아티팩트/스캔 행 데이터셋 (`FilterProcessor`, `ScanDataSource`)
//! - [`LocalArtifactStore`]: 콘텐츠 주소 기반 blob 디렉토리 (`SystemArtifactStore`)
//! - [`JsonExecutionStore`]: 실행 레코드 JSON 파일 (`ExecutionStore`)

mod artifact_store;
mod dataset;
mod execution_store;

pub use artifact_store::{LocalArtifactStore, StoredArtifact};
pub use dataset::{ArtifactEntry, DatasetRow, ProjectEntry, RepositoryEntry, ScanDataset};
pub use execution_store::JsonExecutionStore;

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use scandata_core::error::StorageError;

/// JSON 파일을 읽습니다. 파일이 없으면 기본값을 반환합니다.
async fn read_json_or_default<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::Query(format!("invalid json in {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// 임시 파일에 쓴 뒤 rename하여 JSON 파일을 교체합니다.
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::Query(format!("failed to encode {}: {e}", path.display())))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
