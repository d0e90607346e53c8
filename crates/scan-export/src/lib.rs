#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ExportError`, `FilterStage`)
//! - [`config`]: Export configuration (`ExportConfig`, builder)
//! - [`params`]: Invocation parameter decoding (`JobParams`, `JobMode`)
//! - [`types`]: Domain types (`FilterRequest`, `ScanDataRow`, `ContentDigest`, records, outcome)
//! - [`filter`]: Filter resolution (`FilterProcessor` trait, `FilterResolver`)
//! - [`source`]: Paged scan data retrieval (`ScanDataSource` trait, `ExportQuery`)
//! - [`batch`]: Artifact batching and pagination (`BatchPaginator`)
//! - [`writer`]: Incremental CSV writing (`CsvPageWriter`, `PageSink`)
//! - [`digest`]: Content fingerprint (`DigestCalculator`, `Sha256DigestCalculator`)
//! - [`store`]: Artifact persistence and execution annotation (`SystemArtifactStore`, `ExecutionStore`)
//! - [`scratch`]: Scratch file cleanup (`ScratchFile`)
//! - [`exporter`]: Main orchestrator (`ScanDataExport`, `Job` impl)
//! - [`local`]: File-backed collaborators (`ScanDataset`, `LocalArtifactStore`, `JsonExecutionStore`)
//!
//! # Architecture
//!
//! ```text
//! JobParameters --> JobParams::decode
//!                        |
//!            Request? ---+--- none ------------------------+
//!                        |                                 |
//!                  FilterResolver --(empty)--> NoMatch     |
//!                        |                        |        |
//!                 ExportScope::Artifacts     ExportScope::All
//!                        |                        |
//!                        +-----> BatchPaginator <-+
//!                                     |
//!                              CsvPageWriter (append per page)
//!                                     |
//!                           DigestCalculator (sha256)
//!                                     |
//!                      persist_export --> SystemArtifactStore
//!                                     |
//!                   annotate_execution --> ExecutionStore
//!                                     |
//!                          ScratchFile::release (always)
//! ```

pub mod batch;
pub mod config;
pub mod digest;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod local;
pub mod params;
pub mod scratch;
pub mod source;
pub mod store;
pub mod types;
pub mod writer;

// --- Public API Re-exports ---

// Orchestrator
pub use exporter::{Collaborators, JOB_NAME, ScanDataExport};

// Configuration
pub use config::{ExportConfig, ExportConfigBuilder};

// Error
pub use error::{ExportError, FilterStage};

// Parameters
pub use params::{JobMode, JobParams};

// Types
pub use types::{
    ArtifactId, ContentDigest, ExecutionRecord, ExportOutcome, ExportScope, ExportSummary,
    ExtraAttrs, FilterRequest, ProjectId, RepositoryId, ScanDataRow, SystemArtifactId,
    SystemArtifactRecord,
};

// Pipeline stages
pub use batch::{BatchPaginator, PaginationStats, partition};
pub use digest::{DigestCalculator, Sha256DigestCalculator};
pub use filter::{FilterProcessor, FilterResolver, ProjectScope};
pub use scratch::{CleanupOutcome, ScratchFile};
pub use source::{ExportQuery, ScanDataSource};
pub use store::{ExecutionStore, SystemArtifactStore, annotate_execution, persist_export};
pub use writer::{CsvPageWriter, PageSink};

// Local backends
pub use local::{JsonExecutionStore, LocalArtifactStore, ScanDataset};
