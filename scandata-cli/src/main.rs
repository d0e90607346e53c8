use std::process::ExitCode;

use clap::Parser;

use scandata_cli::cli::{Cli, Commands};
use scandata_cli::error::CliError;
use scandata_cli::output::OutputWriter;
use scandata_cli::{commands, logging};
use scandata_core::config::{GeneralConfig, ScandataConfig};

/// scandata CLI -- 필터링된 스캔 데이터 CSV 내보내기 명령줄 도구
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 설정 파일이 깨져 있어도 로깅은 기본값으로 시작하고, 에러는 명령이 보고합니다.
    let mut general = match ScandataConfig::load(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(config = %cli.config.display(), "scandata starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Export(args) => commands::export::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
