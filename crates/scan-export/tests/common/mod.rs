//! 통합 테스트 공용 mock 협력자
//!
//! 모든 mock은 내부 상태를 `Arc`로 공유하므로, 복제본을 작업에 넘긴 뒤
//! 원본으로 호출 기록을 검사할 수 있습니다.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use scandata_core::error::StorageError;
use scandata_core::types::ExecutionId;
use scandata_export::{
    ArtifactId, Collaborators, ExecutionRecord, ExecutionStore, ExportConfig, ExportConfigBuilder,
    ExportQuery, ExtraAttrs, FilterProcessor, ProjectId, ProjectScope, RepositoryId,
    ScanDataExport, ScanDataRow, ScanDataSource, Sha256DigestCalculator, SystemArtifactId,
    SystemArtifactRecord, SystemArtifactStore,
};

/// 테스트용 작업 타입
pub type TestExport = ScanDataExport<
    MockFilters,
    MockSource,
    Sha256DigestCalculator,
    MockArtifactStore,
    MockExecutionStore,
>;

// ─── 필터 ──────────────────────────────────────────────────────────

/// 모든 단계를 통과시키고 마지막에 지정된 아티팩트를 돌려주는 필터
#[derive(Clone, Default)]
pub struct MockFilters {
    artifacts: Arc<Mutex<Vec<ArtifactId>>>,
    fail: Arc<Mutex<bool>>,
    calls: Arc<Mutex<usize>>,
}

impl MockFilters {
    pub fn resolving(ids: &[i64]) -> Self {
        let filters = Self::default();
        *filters.artifacts.lock().unwrap() = ids.iter().copied().map(ArtifactId).collect();
        filters
    }

    pub fn failing() -> Self {
        let filters = Self::resolving(&[1]);
        *filters.fail.lock().unwrap() = true;
        filters
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn touch(&self) -> Result<(), StorageError> {
        *self.calls.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            return Err(StorageError::Connection("filter backend down".to_owned()));
        }
        Ok(())
    }
}

impl FilterProcessor for MockFilters {
    async fn resolve_projects(
        &self,
        _principal: &str,
        _scope: &ProjectScope,
    ) -> Result<Vec<ProjectId>, StorageError> {
        self.touch()?;
        Ok(vec![ProjectId(1)])
    }

    async fn resolve_repositories(
        &self,
        _names: &BTreeSet<String>,
        _projects: &[ProjectId],
    ) -> Result<Vec<RepositoryId>, StorageError> {
        self.touch()?;
        Ok(vec![RepositoryId(1)])
    }

    async fn resolve_by_tags(
        &self,
        _tags: &BTreeSet<String>,
        _repositories: &[RepositoryId],
    ) -> Result<Vec<ArtifactId>, StorageError> {
        self.touch()?;
        Ok(self.artifacts.lock().unwrap().clone())
    }

    async fn resolve_by_labels(
        &self,
        _labels: &BTreeSet<String>,
        artifacts: &[ArtifactId],
    ) -> Result<Vec<ArtifactId>, StorageError> {
        self.touch()?;
        Ok(artifacts.to_vec())
    }
}

// ─── 데이터 소스 ────────────────────────────────────────────────────

/// 아티팩트별 행 목록을 페이지로 잘라 돌려주는 소스
#[derive(Clone, Default)]
pub struct MockSource {
    rows: Arc<Mutex<Vec<(ArtifactId, ScanDataRow)>>>,
    queries: Arc<Mutex<Vec<ExportQuery>>>,
    fail_on_call: Arc<Mutex<Option<usize>>>,
}

impl MockSource {
    /// 아티팩트마다 `per_artifact`개의 행을 가진 소스
    pub fn with_rows(artifacts: &[i64], per_artifact: usize) -> Self {
        let source = Self::default();
        {
            let mut rows = source.rows.lock().unwrap();
            for &artifact in artifacts {
                for i in 0..per_artifact {
                    rows.push((ArtifactId(artifact), row(artifact, i)));
                }
            }
        }
        source
    }

    /// `call`번째 조회(1부터)에서 실패하도록 설정합니다.
    pub fn fail_on_call(self, call: usize) -> Self {
        *self.fail_on_call.lock().unwrap() = Some(call);
        self
    }

    pub fn queries(&self) -> Vec<ExportQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl ScanDataSource for MockSource {
    async fn fetch_page(&self, query: &ExportQuery) -> Result<Vec<ScanDataRow>, StorageError> {
        let call = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.clone());
            queries.len()
        };
        if *self.fail_on_call.lock().unwrap() == Some(call) {
            return Err(StorageError::Query(format!("page {} failed", query.page_number)));
        }

        let skip = (query.page_number as usize - 1) * query.page_size;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(artifact, _)| {
                query
                    .artifact_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(artifact))
            })
            .filter(|(_, row)| query.cve_ids.is_empty() || query.cve_ids.contains(&row.cve_id))
            .skip(skip)
            .take(query.page_size)
            .map(|(_, row)| row.clone())
            .collect())
    }
}

/// 아티팩트 번호와 순번으로 결정되는 테스트 행
pub fn row(artifact: i64, index: usize) -> ScanDataRow {
    ScanDataRow {
        scanner: "Trivy".to_owned(),
        repository: format!("library/app{artifact}"),
        artifact_digest: format!("sha256:{artifact:064x}"),
        cve_id: format!("CVE-2024-{artifact}{index:03}"),
        package: "openssl".to_owned(),
        version: "1.1.1".to_owned(),
        fixed_version: "1.1.1w".to_owned(),
        severity: "High".to_owned(),
        cwe_ids: "CWE-79".to_owned(),
        cvss_score_v3: Some(7.5),
        cvss_score_v2: None,
        cvss_vector_v3: "CVSS:3.1/AV:N".to_owned(),
        cvss_vector_v2: String::new(),
        additional_data: String::new(),
    }
}

// ─── 시스템 아티팩트 저장소 ────────────────────────────────────────

/// 등록 요청과 콘텐츠를 기록하는 저장소
#[derive(Clone, Default)]
pub struct MockArtifactStore {
    created: Arc<Mutex<Vec<(SystemArtifactRecord, Vec<u8>)>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockArtifactStore {
    pub fn failing() -> Self {
        let store = Self::default();
        *store.fail.lock().unwrap() = true;
        store
    }

    pub fn created(&self) -> Vec<(SystemArtifactRecord, Vec<u8>)> {
        self.created.lock().unwrap().clone()
    }
}

impl SystemArtifactStore for MockArtifactStore {
    async fn create<R>(
        &self,
        record: &SystemArtifactRecord,
        mut content: R,
    ) -> Result<SystemArtifactId, StorageError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        if *self.fail.lock().unwrap() {
            return Err(StorageError::Capacity("artifact store full".to_owned()));
        }
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes).await?;
        let mut created = self.created.lock().unwrap();
        created.push((record.clone(), bytes));
        Ok(SystemArtifactId(created.len() as i64))
    }
}

// ─── 실행 레코드 저장소 ────────────────────────────────────────────

/// 메모리 실행 레코드 저장소
#[derive(Clone, Default)]
pub struct MockExecutionStore {
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
    updates: Arc<Mutex<usize>>,
    fail_update: Arc<Mutex<bool>>,
}

impl MockExecutionStore {
    /// 주어진 속성을 가진 실행 레코드 하나로 시작합니다.
    pub fn with_execution(id: i64, attrs: &[(&str, &str)]) -> Self {
        let store = Self::default();
        let mut record = ExecutionRecord::new(ExecutionId(id));
        for (k, v) in attrs {
            record
                .extra_attrs
                .insert((*k).to_owned(), Value::from(*v));
        }
        store.records.lock().unwrap().push(record);
        store
    }

    pub fn fail_updates(self) -> Self {
        *self.fail_update.lock().unwrap() = true;
        self
    }

    pub fn attrs(&self, id: i64) -> Option<ExtraAttrs> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == ExecutionId(id))
            .map(|r| r.extra_attrs.clone())
    }

    pub fn updates(&self) -> usize {
        *self.updates.lock().unwrap()
    }
}

impl ExecutionStore for MockExecutionStore {
    async fn get(&self, id: ExecutionId) -> Result<ExecutionRecord, StorageError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("execution {id}")))
    }

    async fn update_extra_attrs(
        &self,
        id: ExecutionId,
        attrs: ExtraAttrs,
    ) -> Result<(), StorageError> {
        *self.updates.lock().unwrap() += 1;
        if *self.fail_update.lock().unwrap() {
            return Err(StorageError::Connection("execution db gone".to_owned()));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("execution {id}")))?;
        record.extra_attrs = attrs;
        Ok(())
    }
}

// ─── 조립 ──────────────────────────────────────────────────────────

/// 테스트 임시 디렉토리를 사용하는 설정
pub fn config(export_dir: &Path, group_size: usize, page_size: usize) -> ExportConfig {
    ExportConfigBuilder::new()
        .export_dir(export_dir)
        .artifact_group_size(group_size)
        .query_page_size(page_size)
        .build()
        .unwrap()
}

/// mock 복제본으로 작업을 조립합니다.
pub fn build_export(
    config: ExportConfig,
    filters: &MockFilters,
    source: &MockSource,
    artifacts: &MockArtifactStore,
    executions: &MockExecutionStore,
) -> TestExport {
    ScanDataExport::new(
        config,
        Collaborators {
            filters: filters.clone(),
            source: source.clone(),
            digest: Sha256DigestCalculator,
            artifacts: artifacts.clone(),
            executions: executions.clone(),
        },
    )
    .unwrap()
}
