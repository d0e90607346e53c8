//! 콘텐츠 주소 기반 로컬 시스템 아티팩트 저장소
//!
//! ```text
//! <root>/
//! ├── artifacts.json            # 등록 레코드 인덱스
//! └── blobs/sha256/<hex>        # 콘텐츠
//! ```
//!
//! 같은 다이제스트가 이미 등록되어 있으면 blob을 다시 쓰지 않고 기존 ID를 반환합니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

use scandata_core::error::StorageError;

use crate::store::SystemArtifactStore;
use crate::types::{ContentDigest, SystemArtifactId, SystemArtifactRecord};

use super::{read_json_or_default, write_json_atomic};

const INDEX_FILE: &str = "artifacts.json";

/// 인덱스에 기록된 아티팩트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub id: SystemArtifactId,
    #[serde(flatten)]
    pub record: SystemArtifactRecord,
}

/// 로컬 디렉토리 아티팩트 저장소
pub struct LocalArtifactStore {
    root: PathBuf,
    // 인덱스 읽기-수정-쓰기 구간 직렬화
    index_lock: Mutex<()>,
}

impl LocalArtifactStore {
    /// 저장소 루트 디렉토리를 지정합니다. 디렉토리는 첫 등록 시 생성됩니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_lock: Mutex::new(()),
        }
    }

    /// 저장소 루트 디렉토리
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 다이제스트에 해당하는 blob 경로
    pub fn blob_path(&self, digest: &ContentDigest) -> PathBuf {
        self.root
            .join("blobs")
            .join(ContentDigest::ALGORITHM)
            .join(digest.hex())
    }

    /// 등록된 아티팩트 목록
    pub async fn list(&self) -> Result<Vec<StoredArtifact>, StorageError> {
        read_json_or_default(&self.index_path()).await
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }
}

impl SystemArtifactStore for LocalArtifactStore {
    async fn create<R>(
        &self,
        record: &SystemArtifactRecord,
        mut content: R,
    ) -> Result<SystemArtifactId, StorageError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let _guard = self.index_lock.lock().await;
        let mut index: Vec<StoredArtifact> = read_json_or_default(&self.index_path()).await?;

        if let Some(existing) = index.iter().find(|a| a.record.digest == record.digest) {
            info!(
                artifact_id = %existing.id,
                digest = %record.digest,
                "artifact with identical digest already stored"
            );
            return Ok(existing.id);
        }

        let blob = self.blob_path(&record.digest);
        if let Some(parent) = blob.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = blob.with_extension("partial");
        let mut file = tokio::fs::File::create(&partial).await?;
        let copied = tokio::io::copy(&mut content, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if copied != record.size {
            // 불완전한 blob은 남기지 않는다
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StorageError::Query(format!(
                "content size mismatch for {}: expected {} bytes, read {copied}",
                record.digest, record.size
            )));
        }
        tokio::fs::rename(&partial, &blob).await?;

        let id = SystemArtifactId(index.iter().map(|a| a.id.0).max().unwrap_or(0) + 1);
        index.push(StoredArtifact {
            id,
            record: record.clone(),
        });
        write_json_atomic(&self.index_path(), &index).await?;

        debug!(artifact_id = %id, blob = %blob.display(), "artifact blob stored");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(digest: ContentDigest, size: u64) -> SystemArtifactRecord {
        SystemArtifactRecord {
            repository: "scandata_export_1".to_owned(),
            digest,
            size,
            artifact_type: "ScanData_CSV".to_owned(),
            vendor: "scan_data_export".to_owned(),
        }
    }

    #[tokio::test]
    async fn create_stores_blob_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let digest = ContentDigest::from_sha256([1u8; 32]);

        let id = store
            .create(&record(digest.clone(), 5), &b"hello"[..])
            .await
            .unwrap();

        assert_eq!(id, SystemArtifactId(1));
        assert_eq!(std::fs::read(store.blob_path(&digest)).unwrap(), b"hello");
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record.digest, digest);
    }

    #[tokio::test]
    async fn create_deduplicates_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let digest = ContentDigest::from_sha256([2u8; 32]);

        let first = store
            .create(&record(digest.clone(), 3), &b"abc"[..])
            .await
            .unwrap();
        let second = store
            .create(&record(digest, 3), &b"abc"[..])
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ids_increase_for_distinct_digests() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        let a = store
            .create(&record(ContentDigest::from_sha256([3u8; 32]), 1), &b"a"[..])
            .await
            .unwrap();
        let b = store
            .create(&record(ContentDigest::from_sha256([4u8; 32]), 1), &b"b"[..])
            .await
            .unwrap();

        assert_eq!(a, SystemArtifactId(1));
        assert_eq!(b, SystemArtifactId(2));
    }

    #[tokio::test]
    async fn size_mismatch_is_rejected_without_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let digest = ContentDigest::from_sha256([5u8; 32]);

        let err = store
            .create(&record(digest.clone(), 100), &b"short"[..])
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Query(_)));
        assert!(!store.blob_path(&digest).exists());
        assert!(store.list().await.unwrap().is_empty());
    }
}
