//! scandata CLI library
//!
//! Argument parsing, output rendering and subcommand handlers for the `scandata` binary.
//! Exposed as a library so handlers can be exercised from integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
