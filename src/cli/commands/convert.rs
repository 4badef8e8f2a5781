use super::{build_engine, install_interrupt_handler, print_summary};
use crate::cli::args::ConvertArgs;
use crate::services::{validate_inputs, AppConfig};
use anyhow::Result;
use tracing::info;

/// convert コマンド
pub async fn execute_convert(args: ConvertArgs, mut config: AppConfig) -> Result<()> {
    args.apply_to(&mut config);
    config.validate()?;

    let target = args.target_format(&config);
    let format = validate_inputs(&args.path, &target, &config.extensions)?;

    info!(
        input_dir = %args.path.display(),
        format = %format,
        workers = config.workers,
        dry_run = config.dry_run,
        "Starting conversion"
    );

    let engine = build_engine(&config, args.rate_limit, args.quiet, config.resume_enabled)?;
    install_interrupt_handler(engine.cancel_signal());

    let summary = engine.run(&args.path, format).await?;

    if summary.total_files == 0 {
        println!("⚠️  No supported image files found in: {}", args.path.display());
        return Ok(());
    }

    print_summary(&summary, config.dry_run);
    Ok(())
}
