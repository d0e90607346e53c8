//! CLI-specific error types and exit code mapping

use scandata_core::error::ScandataError;
use scandata_export::ExportError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The job was invoked with missing or malformed parameters.
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    /// The export pipeline failed at the named stage.
    #[error("export failed at {stage}: {reason}")]
    Export { stage: &'static str, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from scandata-core.
    #[error("{0}")]
    Core(#[from] ScandataError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success (including no match)   |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 3    | Invalid job invocation         |
    /// | 5    | Export pipeline failure        |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::InvalidInvocation(_) => 3,
            Self::Export { .. } => 5,
            Self::Io(_) => 10,
            Self::Core(ScandataError::Config(_)) => 2,
            Self::Core(ScandataError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        let reason = e.to_string();
        match e {
            ExportError::InvalidInvocation { .. } => Self::InvalidInvocation(reason),
            ExportError::Config { .. } => Self::Config(reason),
            ExportError::Io { source, .. } => Self::Io(std::io::Error::new(source.kind(), reason)),
            other => Self::Export {
                stage: other.stage(),
                reason,
            },
        }
    }
}
