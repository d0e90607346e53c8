//! 스캔 데이터 내보내기 오케스트레이터
//!
//! [`ScanDataExport`]는 호출 파라미터 디코딩부터 임시 파일 정리까지 한 번의 실행을 관리합니다.
//! 모든 협력자는 생성 시 명시적으로 주입받으며 내부에서 기본 구현을 만들지 않습니다.
//!
//! # 실행 흐름
//!
//! ```text
//! decode ─> resolve filters ─┬─ empty ────────────────────────────────────────┐
//!                            └─> write pages ─> digest ─> persist ─> annotate ─┤
//!                                                                              ▼
//!                                                               release scratch (항상)
//! ```
//!
//! 실패하면 이후 단계는 실행되지 않으며, 아티팩트 등록 없이 임시 파일만 정리됩니다.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{Instrument, error, info, info_span, warn};

use scandata_core::error::ScandataError;
use scandata_core::job::{Job, JobParameters};
use scandata_core::metrics as m;

use crate::batch::BatchPaginator;
use crate::config::ExportConfig;
use crate::digest::DigestCalculator;
use crate::error::ExportError;
use crate::filter::{FilterProcessor, FilterResolver};
use crate::params::JobParams;
use crate::scratch::ScratchFile;
use crate::source::ScanDataSource;
use crate::store::{
    ArtifactTags, ExecutionStore, SystemArtifactStore, annotate_execution, persist_export,
};
use crate::types::{ExportOutcome, ExportScope, ExportSummary};
use crate::writer::CsvPageWriter;

/// 스케줄러에 등록되는 작업 이름
pub const JOB_NAME: &str = "SCAN_DATA_EXPORT";
/// 실패 시 최대 재시도 횟수
pub const MAX_FAILS: u32 = 1;
/// 동시에 활성화될 수 있는 실행 수
pub const MAX_CONCURRENCY: u32 = 1;

/// 내보내기 작업이 사용하는 협력자 묶음
pub struct Collaborators<F, S, D, A, E> {
    /// 필터 해석
    pub filters: F,
    /// 스캔 데이터 조회
    pub source: S,
    /// 다이제스트 계산
    pub digest: D,
    /// 시스템 아티팩트 저장소
    pub artifacts: A,
    /// 실행 레코드 저장소
    pub executions: E,
}

/// 스캔 데이터 내보내기 작업
pub struct ScanDataExport<F, S, D, A, E> {
    config: ExportConfig,
    filters: F,
    source: S,
    digest: D,
    artifacts: A,
    executions: E,
}

impl<F, S, D, A, E> ScanDataExport<F, S, D, A, E>
where
    F: FilterProcessor,
    S: ScanDataSource,
    D: DigestCalculator,
    A: SystemArtifactStore,
    E: ExecutionStore,
{
    /// 설정을 검증하고 작업을 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않으면 `ExportError::Config`
    pub fn new(
        config: ExportConfig,
        collaborators: Collaborators<F, S, D, A, E>,
    ) -> Result<Self, ExportError> {
        config.validate()?;
        let Collaborators {
            filters,
            source,
            digest,
            artifacts,
            executions,
        } = collaborators;

        Ok(Self {
            config,
            filters,
            source,
            digest,
            artifacts,
            executions,
        })
    }

    /// 작업 설정
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// 스케줄러 파라미터 맵으로 내보내기를 실행합니다.
    pub async fn export(&self, params: &JobParameters) -> Result<ExportOutcome, ExportError> {
        let params = match JobParams::decode(params) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "rejecting scan data export invocation");
                record_failure(&e);
                return Err(e);
            }
        };
        self.run_export(&params).await
    }

    /// 디코딩된 파라미터로 내보내기를 실행합니다.
    ///
    /// 실행 전체가 `scan_data_export` span 안에서 진행되어 모든 로그에 `job_id`가 붙습니다.
    pub async fn run_export(&self, params: &JobParams) -> Result<ExportOutcome, ExportError> {
        let span = info_span!("scan_data_export", job_id = %params.job_id, mode = %params.mode);
        self.execute(params).instrument(span).await
    }

    async fn execute(&self, params: &JobParams) -> Result<ExportOutcome, ExportError> {
        let started = Instant::now();
        info!(
            filtered = params.request.is_some(),
            "scan data export started"
        );

        let scratch = ScratchFile::for_job(&self.config.export_dir, params.job_id);
        let result = self.run_stages(params, &scratch).await;
        scratch.release().await;

        metrics::histogram!(m::EXPORT_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match &result {
            Ok(ExportOutcome::NoMatch) => {
                metrics::counter!(m::EXPORT_JOBS_TOTAL, m::LABEL_RESULT => "no_match")
                    .increment(1);
                info!("no artifacts matched the export filters, nothing exported");
            }
            Ok(ExportOutcome::Exported(summary)) => {
                metrics::counter!(m::EXPORT_JOBS_TOTAL, m::LABEL_RESULT => "success").increment(1);
                info!(
                    artifact_id = %summary.artifact_id,
                    digest = %summary.digest,
                    rows = summary.rows,
                    size = summary.size,
                    "scan data export completed"
                );
            }
            Err(e) => {
                record_failure(e);
                error!(stage = e.stage(), error = %e, "scan data export failed");
            }
        }

        result
    }

    async fn run_stages(
        &self,
        params: &JobParams,
        scratch: &ScratchFile,
    ) -> Result<ExportOutcome, ExportError> {
        let (scope, cve_ids) = match &params.request {
            None => (ExportScope::All, BTreeSet::new()),
            Some(request) => {
                let ids = FilterResolver::new(&self.filters).resolve(request).await?;
                metrics::gauge!(m::EXPORT_ARTIFACTS_RESOLVED).set(ids.len() as f64);
                if ids.is_empty() {
                    return Ok(ExportOutcome::NoMatch);
                }
                (ExportScope::Artifacts(ids), request.cve_ids.clone())
            }
        };

        tokio::fs::create_dir_all(&self.config.export_dir)
            .await
            .map_err(|source| ExportError::Io {
                path: self.config.export_dir.display().to_string(),
                source,
            })?;

        let mut writer = CsvPageWriter::create(scratch.path()).await?;
        let stats = BatchPaginator::new(
            &self.source,
            self.config.artifact_group_size,
            self.config.query_page_size,
            cve_ids,
        )
        .run(scope, &mut writer)
        .await?;
        let written = writer.finish().await?;

        let digest = self.digest.calculate(&written.path).await?;

        let persisted = persist_export(
            &self.artifacts,
            &written.path,
            &digest,
            ArtifactTags {
                artifact_type: &self.config.artifact_type,
                vendor: &self.config.vendor,
            },
        )
        .await?;

        annotate_execution(
            &self.executions,
            params.job_id,
            &self.config.digest_key,
            &digest,
        )
        .await?;

        Ok(ExportOutcome::Exported(ExportSummary {
            execution_id: params.job_id,
            artifact_id: persisted.id,
            repository: persisted.repository,
            digest,
            size: persisted.size,
            rows: written.rows,
            pages: stats.pages,
            batches: stats.batches,
        }))
    }
}

fn record_failure(err: &ExportError) {
    metrics::counter!(m::EXPORT_JOBS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
    metrics::counter!(m::EXPORT_FAILURES_TOTAL, m::LABEL_STAGE => err.stage()).increment(1);
}

impl<F, S, D, A, E> Job for ScanDataExport<F, S, D, A, E>
where
    F: FilterProcessor,
    S: ScanDataSource,
    D: DigestCalculator,
    A: SystemArtifactStore,
    E: ExecutionStore,
{
    type Output = ExportOutcome;

    fn name(&self) -> &str {
        JOB_NAME
    }

    fn max_fails(&self) -> u32 {
        MAX_FAILS
    }

    fn max_concurrency(&self) -> u32 {
        MAX_CONCURRENCY
    }

    fn should_retry(&self) -> bool {
        true
    }

    fn validate(&self, params: &JobParameters) -> Result<(), ScandataError> {
        JobParams::decode(params)?;
        Ok(())
    }

    async fn run(&self, params: &JobParameters) -> Result<ExportOutcome, ScandataError> {
        Ok(self.export(params).await?)
    }
}
