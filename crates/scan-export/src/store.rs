//! 시스템 아티팩트 등록 및 실행 레코드 갱신
//!
//! - [`persist_export`]: 완성된 파일을 다이제스트와 함께 [`SystemArtifactStore`]에 등록
//! - [`annotate_execution`]: 실행 레코드의 기존 extra attrs를 보존한 채 다이제스트 키를 추가

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncRead;
use tracing::info;

use scandata_core::error::StorageError;
use scandata_core::metrics as m;
use scandata_core::types::ExecutionId;

use crate::error::ExportError;
use crate::types::{
    ContentDigest, ExecutionRecord, ExtraAttrs, SystemArtifactId, SystemArtifactRecord,
};

/// 시스템 아티팩트 저장소
pub trait SystemArtifactStore: Send + Sync {
    /// 레코드와 콘텐츠 스트림을 등록하고 레코드 ID를 반환합니다.
    ///
    /// 콘텐츠는 등록이 끝날 때까지 끝까지 읽혀야 합니다.
    fn create<R>(
        &self,
        record: &SystemArtifactRecord,
        content: R,
    ) -> impl Future<Output = Result<SystemArtifactId, StorageError>> + Send
    where
        R: AsyncRead + Unpin + Send + 'static;
}

/// 작업 실행 레코드 저장소
pub trait ExecutionStore: Send + Sync {
    /// 실행 레코드를 조회합니다. 없으면 `StorageError::NotFound`.
    fn get(
        &self,
        id: ExecutionId,
    ) -> impl Future<Output = Result<ExecutionRecord, StorageError>> + Send;

    /// 실행 레코드의 extra attrs를 주어진 맵으로 교체합니다.
    fn update_extra_attrs(
        &self,
        id: ExecutionId,
        attrs: ExtraAttrs,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: SystemArtifactStore> SystemArtifactStore for Arc<T> {
    fn create<R>(
        &self,
        record: &SystemArtifactRecord,
        content: R,
    ) -> impl Future<Output = Result<SystemArtifactId, StorageError>> + Send
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        (**self).create(record, content)
    }
}

impl<T: ExecutionStore> ExecutionStore for Arc<T> {
    fn get(
        &self,
        id: ExecutionId,
    ) -> impl Future<Output = Result<ExecutionRecord, StorageError>> + Send {
        (**self).get(id)
    }

    fn update_extra_attrs(
        &self,
        id: ExecutionId,
        attrs: ExtraAttrs,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).update_extra_attrs(id, attrs)
    }
}

/// 시스템 아티팩트 태그
#[derive(Debug, Clone, Copy)]
pub struct ArtifactTags<'a> {
    /// 아티팩트 유형
    pub artifact_type: &'a str,
    /// 벤더 (소문자로 변환하여 기록)
    pub vendor: &'a str,
}

/// 등록 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    /// 저장소가 발급한 ID
    pub id: SystemArtifactId,
    /// 리포지토리 이름
    pub repository: String,
    /// 파일 크기 (바이트)
    pub size: u64,
}

/// 파일 이름에서 마지막 확장자를 뺀 리포지토리 이름
///
/// `scandata_export_42.csv` -> `scandata_export_42`
pub fn repository_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 닫힌 내보내기 파일을 시스템 아티팩트로 등록합니다.
///
/// 파일 크기는 등록 직전에 다시 읽으며, 콘텐츠는 읽기 전용 핸들로 스트리밍합니다.
pub async fn persist_export<A: SystemArtifactStore>(
    store: &A,
    path: &Path,
    digest: &ContentDigest,
    tags: ArtifactTags<'_>,
) -> Result<PersistedArtifact, ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
    let content = tokio::fs::File::open(path).await.map_err(io_error)?;

    let record = SystemArtifactRecord {
        repository: repository_name(path),
        digest: digest.clone(),
        size,
        artifact_type: tags.artifact_type.to_owned(),
        vendor: tags.vendor.to_lowercase(),
    };

    let id = store
        .create(&record, content)
        .await
        .map_err(|source| ExportError::Persistence {
            repository: record.repository.clone(),
            source,
        })?;

    metrics::counter!(m::EXPORT_BYTES_TOTAL).increment(size);
    info!(
        artifact_id = %id,
        repository = %record.repository,
        digest = %digest,
        size,
        "export registered as system artifact"
    );

    Ok(PersistedArtifact {
        id,
        repository: record.repository,
        size,
    })
}

/// 실행 레코드의 extra attrs에 다이제스트를 기록합니다.
///
/// 기존 키는 모두 보존되며, 같은 키가 있으면 새 다이제스트로 덮어씁니다.
pub async fn annotate_execution<E: ExecutionStore>(
    store: &E,
    execution_id: ExecutionId,
    digest_key: &str,
    digest: &ContentDigest,
) -> Result<(), ExportError> {
    let annotation_error = |source| ExportError::Annotation {
        execution_id,
        source,
    };

    let record = store.get(execution_id).await.map_err(annotation_error)?;

    let mut attrs = record.extra_attrs;
    attrs.insert(digest_key.to_owned(), Value::String(digest.to_string()));

    store
        .update_extra_attrs(execution_id, attrs)
        .await
        .map_err(annotation_error)?;

    info!(
        execution_id = %execution_id,
        key = digest_key,
        digest = %digest,
        "execution annotated with export digest"
    );
    Ok(())
}
