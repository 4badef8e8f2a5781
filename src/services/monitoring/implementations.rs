// 進捗監視の具象実装

use crate::core::{ConversionResult, ProgressReporter, ResultStatus};
use async_trait::async_trait;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// 1件分の表示行
    pub fn format_line(result: &ConversionResult, completed: usize, total: usize) -> String {
        let source = result.original_path.display();
        match result.status() {
            ResultStatus::Converted => match &result.new_path {
                Some(new_path) => {
                    format!("[{completed}/{total}] ✅ {source} → {}", new_path.display())
                }
                None => format!("[{completed}/{total}] ✅ {source}"),
            },
            ResultStatus::Skipped => match &result.new_path {
                // ドライランは出力先のみ確定している
                Some(new_path) => {
                    format!("[{completed}/{total}] 🔍 {source} → {} (dry run)", new_path.display())
                }
                None => format!("[{completed}/{total}] ⏭️  {source} (already in target format)"),
            },
            ResultStatus::Failed => {
                let error = result
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                format!("[{completed}/{total}] ❌ {source}: {error}")
            }
        }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, total_files: usize) {
        if !self.quiet {
            println!("🚀 Starting conversion of {total_files} files...");
        }
    }

    async fn report_result(&self, result: &ConversionResult, completed: usize, total: usize) {
        if self.quiet {
            return;
        }
        let line = Self::format_line(result, completed, total);
        if result.is_failure() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    async fn report_completed(&self, converted: usize, skipped: usize, failed: usize) {
        if !self.quiet {
            println!("✅ Completed! Converted: {converted}, Skipped: {skipped}, Failed: {failed}");
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _total_files: usize) {
        // 何もしない
    }

    async fn report_result(&self, _result: &ConversionResult, _completed: usize, _total: usize) {
        // 何もしない
    }

    async fn report_completed(&self, _converted: usize, _skipped: usize, _failed: usize) {
        // 何もしない
    }
}
