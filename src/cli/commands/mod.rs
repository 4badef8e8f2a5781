pub mod convert;
pub mod resume;

pub use convert::*;
pub use resume::*;

use crate::codec::standard::StandardCodec;
use crate::core::{JobProcessor, ProgressReporter};
use crate::engine::{CancelSignal, ProcessingEngine, ProcessingSummary};
use crate::services::{
    AppConfig, ConsoleProgressReporter, Converter, DefaultProcessingConfig, FileCollector,
    JsonCheckpointStore,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// CLI用のエンジン
pub type CliEngine =
    ProcessingEngine<DefaultProcessingConfig, Box<dyn ProgressReporter>, JsonCheckpointStore>;

/// 設定からエンジンを組み立てる
pub fn build_engine(
    config: &AppConfig,
    rate_limit: Option<f64>,
    quiet: bool,
    checkpointing: bool,
) -> Result<CliEngine> {
    let processor: Arc<dyn JobProcessor> = Arc::new(Converter::new(
        StandardCodec::new(),
        config.convert_options(),
    ));
    let reporter: Box<dyn ProgressReporter> = if quiet {
        Box::new(ConsoleProgressReporter::quiet())
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let engine = ProcessingEngine::new(
        processor,
        FileCollector::new(config.collector_options()),
        config.path_resolver(),
        config.processing_config(rate_limit),
        reporter,
        JsonCheckpointStore::with_default_path()?,
    )
    .with_checkpointing(checkpointing);

    Ok(engine)
}

/// Ctrl-C でワーカーを止める
pub fn install_interrupt_handler(cancel: CancelSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping workers...");
            cancel.cancel();
        }
    });
}

/// 実行結果の表示
pub fn print_summary(summary: &ProcessingSummary, dry_run: bool) {
    if summary.cancelled {
        println!(
            "⏸️  Interrupted after {} files. Run `image_convert resume` to continue.",
            summary.report.total_files
        );
    }
    if dry_run {
        println!("🔍 Dry run: no files were written or removed");
    }
    println!("{}", summary.report);
}
