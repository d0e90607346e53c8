//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// scandata -- filtered scan data CSV export.
///
/// Use `scandata <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scandata", version, about, long_about = None)]
pub struct Cli {
    /// Path to the scandata.toml configuration file.
    #[arg(short, long, default_value = "scandata.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one scan data export job against the local backends.
    Export(ExportArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- export ----

/// Run a scan data export job.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Execution id the export result is attached to.
    #[arg(long)]
    pub job_id: i64,

    /// JSON file holding the filter request (omit to export everything).
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Job mode.
    #[arg(long, default_value = "export")]
    pub mode: String,
}

// ---- config ----

/// Manage scandata configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, export, storage).
        #[arg(long)]
        section: Option<String>,
    },
}
