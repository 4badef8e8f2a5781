use super::{build_engine, install_interrupt_handler, print_summary};
use crate::cli::args::ResumeArgs;
use crate::core::CheckpointStore;
use crate::services::AppConfig;
use anyhow::Result;

/// resume コマンド
pub async fn execute_resume(args: ResumeArgs, mut config: AppConfig) -> Result<()> {
    args.apply_to(&mut config);
    config.validate()?;

    // 再開時は常にチェックポイントを更新する
    let engine = build_engine(&config, args.rate_limit, args.quiet, true)?;

    let Some(state) = engine.checkpoint().load().await? else {
        println!("⚠️  No previous conversion session found to resume");
        return Ok(());
    };

    println!(
        "🔄 Resuming conversion session from {}",
        state.start_time.format("%Y-%m-%d %H:%M:%S")
    );
    println!("📁 Input directory: {}", state.input_dir.display());
    println!("🎯 Target format: {}", state.target_format);
    println!(
        "📊 Progress: {}/{} files processed",
        state.processed_count(),
        state.total_files
    );

    install_interrupt_handler(engine.cancel_signal());
    match engine.resume().await? {
        Some(summary) => print_summary(&summary, config.dry_run),
        None => println!("⚠️  No previous conversion session found to resume"),
    }
    Ok(())
}
