//! `scandata export` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use scandata_core::config::ScandataConfig;
use scandata_core::error::{ScandataError, StorageError};
use scandata_core::job::JobParameters;
use scandata_core::types::ExecutionId;
use scandata_export::params::{JOB_ID_KEY, MODE_KEY, REQUEST_KEY};
use scandata_export::{
    Collaborators, ExecutionRecord, ExecutionStore, ExportConfig, ExportOutcome, JobParams,
    JsonExecutionStore, LocalArtifactStore, ScanDataExport, ScanDataset, Sha256DigestCalculator,
};

use crate::cli::ExportArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `export` command.
pub async fn execute(
    args: ExportArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = ScandataConfig::load(config_path).await?;
    let report = run(&config, &args).await?;
    writer.render(&report)?;
    Ok(())
}

/// Run one export job against the local backends named in `[storage]`.
///
/// The execution record for `--job-id` is created first if the store does not know it,
/// so a standalone run always has something to annotate. Parameters are decoded
/// before any store is opened.
pub async fn run(config: &ScandataConfig, args: &ExportArgs) -> Result<ExportReport, CliError> {
    let params = JobParams::decode(&build_parameters(args).await?)?;

    let dataset = Arc::new(
        ScanDataset::load(&config.storage.dataset_path)
            .await
            .map_err(ScandataError::from)?,
    );
    let artifacts = Arc::new(LocalArtifactStore::new(&config.storage.artifact_store_dir));
    let executions = Arc::new(JsonExecutionStore::new(&config.storage.execution_store_path));

    seed_execution(&executions, params.job_id).await?;

    let export = ScanDataExport::new(
        ExportConfig::from_core(&config.export),
        Collaborators {
            filters: Arc::clone(&dataset),
            source: dataset,
            digest: Sha256DigestCalculator,
            artifacts,
            executions,
        },
    )?;

    info!(job_id = %params.job_id, "running scan data export");
    let outcome = export.run_export(&params).await?;
    Ok(ExportReport::new(params.job_id, &outcome))
}

/// Assemble the scheduler parameter map from command-line arguments.
async fn build_parameters(args: &ExportArgs) -> Result<JobParameters, CliError> {
    let mut params = JobParameters::new();
    params.insert(MODE_KEY.to_owned(), Value::String(args.mode.clone()));
    params.insert(JOB_ID_KEY.to_owned(), Value::from(args.job_id));

    if let Some(path) = &args.request {
        let content = tokio::fs::read_to_string(path).await?;
        let request: Value = serde_json::from_str(&content).map_err(|e| {
            CliError::InvalidInvocation(format!(
                "request file {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })?;
        params.insert(REQUEST_KEY.to_owned(), request);
    }

    Ok(params)
}

async fn seed_execution(store: &JsonExecutionStore, id: ExecutionId) -> Result<(), CliError> {
    match store.get(id).await {
        Ok(_) => Ok(()),
        Err(StorageError::NotFound(_)) => {
            warn!(execution_id = %id, "execution record not found, registering a new one");
            store
                .register(ExecutionRecord::new(id))
                .await
                .map_err(|e| CliError::Core(e.into()))
        }
        Err(e) => Err(CliError::Core(e.into())),
    }
}

/// Export result report.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    /// Execution id the job ran for
    pub job_id: i64,
    /// `exported` or `no_match`
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// File size in bytes
    pub size: u64,
    /// Data rows written (header excluded)
    pub rows: u64,
    pub pages: u64,
    pub batches: usize,
}

impl ExportReport {
    fn new(job_id: ExecutionId, outcome: &ExportOutcome) -> Self {
        match outcome {
            ExportOutcome::NoMatch => Self {
                job_id: job_id.get(),
                outcome: "no_match",
                artifact_id: None,
                repository: None,
                digest: None,
                size: 0,
                rows: 0,
                pages: 0,
                batches: 0,
            },
            ExportOutcome::Exported(summary) => Self {
                job_id: job_id.get(),
                outcome: "exported",
                artifact_id: Some(summary.artifact_id.0),
                repository: Some(summary.repository.clone()),
                digest: Some(summary.digest.to_string()),
                size: summary.size,
                rows: summary.rows,
                pages: summary.pages,
                batches: summary.batches,
            },
        }
    }
}

impl Render for ExportReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan Data Export: job {}", self.job_id.to_string().bold())?;

        let (Some(artifact_id), Some(digest)) = (self.artifact_id, &self.digest) else {
            writeln!(w, "  Result: {}", "NO MATCH".yellow().bold())?;
            writeln!(w, "  No artifacts matched the filters, nothing was exported.")?;
            return Ok(());
        };

        writeln!(w, "  Result:     {}", "EXPORTED".green().bold())?;
        writeln!(w, "  Artifact:   {}", artifact_id)?;
        if let Some(repository) = &self.repository {
            writeln!(w, "  Repository: {}", repository)?;
        }
        writeln!(w, "  Digest:     {}", digest)?;
        writeln!(w, "  Size:       {} bytes", self.size)?;
        writeln!(
            w,
            "  Rows:       {} ({} pages in {} batches)",
            self.rows, self.pages, self.batches
        )?;
        Ok(())
    }
}
