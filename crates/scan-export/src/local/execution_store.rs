//! JSON 파일 기반 실행 레코드 저장소

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use scandata_core::error::StorageError;
use scandata_core::types::ExecutionId;

use crate::store::ExecutionStore;
use crate::types::{ExecutionRecord, ExtraAttrs};

use super::{read_json_or_default, write_json_atomic};

/// 실행 레코드 배열을 하나의 JSON 파일에 보관하는 저장소
pub struct JsonExecutionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonExecutionStore {
    /// 파일 경로를 지정합니다. 파일이 없으면 빈 저장소로 취급합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// 저장 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 실행 레코드를 등록합니다. 같은 ID가 있으면 교체합니다.
    pub async fn register(&self, record: ExecutionRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        write_json_atomic(&self.path, &records).await
    }

    /// 모든 실행 레코드
    pub async fn list(&self) -> Result<Vec<ExecutionRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn load(&self) -> Result<Vec<ExecutionRecord>, StorageError> {
        read_json_or_default(&self.path).await
    }
}

impl ExecutionStore for JsonExecutionStore {
    async fn get(&self, id: ExecutionId) -> Result<ExecutionRecord, StorageError> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("execution {id}")))
    }

    async fn update_extra_attrs(
        &self,
        id: ExecutionId,
        attrs: ExtraAttrs,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("execution {id}")))?;
        record.extra_attrs = attrs;
        write_json_atomic(&self.path, &records).await?;
        debug!(execution_id = %id, "execution extra attrs updated");
        Ok(())
    }
}
