use anyhow::Result;
use clap::Parser;
use image_convert::cli::{execute_convert, execute_resume, Cli, Commands};
use image_convert::logging::{default_log_path, init_logging};
use image_convert::AppConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load_or_create(&config_path)?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    let log_path = if cli.log_file {
        Some(default_log_path()?)
    } else {
        None
    };
    // ガードはこの関数の終わりまで保持（ファイルへの書き出しを完了させる）
    let _guard = init_logging(level, log_path.as_deref())?;

    match cli.command {
        Commands::Convert(args) => execute_convert(args, config).await,
        Commands::Resume(args) => execute_resume(args, config).await,
    }
}
