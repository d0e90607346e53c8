//! Diagnostic output for `scandata` runs.
//!
//! Export progress is emitted through `tracing`
//! and rendered to stderr as JSON lines or pretty text, chosen by
//! `[general] log_format`. Command reports own stdout.

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use scandata_core::config::GeneralConfig;

/// Install the process-wide subscriber for one `scandata` invocation.
///
/// `main` calls this after merging `--log-level` into `[general]`, so the
/// level comes from the flag, then the config file. A set `RUST_LOG`
/// overrides both. The subscriber writes to stderr only; stdout carries
/// the text or `--output json` report.
///
/// Fails on an unrecognized `log_format` or if a subscriber is already set.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let installed = match config.log_format.as_str() {
        "json" => registry.with(layer.json()).try_init(),
        "pretty" => registry.with(layer.pretty()).try_init(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    installed.with_context(|| format!("failed to install {} log subscriber", config.log_format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_rejects_unknown_format_before_installing() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn test_init_tracing_second_install_fails() {
        let json = GeneralConfig {
            log_level: "warn".to_owned(),
            log_format: "json".to_owned(),
        };
        let pretty = GeneralConfig {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        };
        // whichever test installs first, the global slot is taken by now
        let _ = init_tracing(&json);
        let err = init_tracing(&pretty).unwrap_err();
        assert!(err.to_string().contains("failed to install pretty log subscriber"));
    }
}
