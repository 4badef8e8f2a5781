// 変換結果の集計とレポート

use crate::core::{ConversionResult, ResultStatus};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// 結果ストリームを1件ずつ取り込む集計器
///
/// 結果処理ループからのみ更新される。派生値は `finalize` で一度だけ計算する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionStatistics {
    total_files: usize,
    converted_files: usize,
    skipped_files: usize,
    failed_files: usize,
    total_size_before: u64,
    total_size_after: u64,
    total_duration: Duration,
    failure_reasons: BTreeMap<String, usize>,
}

impl ConversionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: &ConversionResult) {
        self.total_files += 1;
        self.total_duration += result.duration;

        match result.status() {
            ResultStatus::Failed => {
                self.failed_files += 1;
                if let Some(error) = &result.error {
                    *self.failure_reasons.entry(error.to_string()).or_insert(0) += 1;
                }
            }
            ResultStatus::Skipped => self.skipped_files += 1,
            ResultStatus::Converted => {
                self.converted_files += 1;
                self.total_size_before += result.original_size;
                self.total_size_after += result.new_size;
            }
        }
    }

    /// 派生値を計算して最終レポートにする
    pub fn finalize(self) -> StatisticsReport {
        let average_duration = if self.total_files > 0 {
            self.total_duration / self.total_files as u32
        } else {
            Duration::ZERO
        };
        let space_saved = self.total_size_before as i64 - self.total_size_after as i64;
        let compression_ratio = if self.total_size_before > 0 {
            self.total_size_after as f64 / self.total_size_before as f64
        } else {
            0.0
        };

        StatisticsReport {
            total_files: self.total_files,
            converted_files: self.converted_files,
            skipped_files: self.skipped_files,
            failed_files: self.failed_files,
            total_size_before: self.total_size_before,
            total_size_after: self.total_size_after,
            total_duration: self.total_duration,
            average_duration,
            space_saved,
            compression_ratio,
            failure_reasons: self.failure_reasons,
        }
    }
}

/// 確定済みの集計結果
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub total_files: usize,
    pub converted_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub total_duration: Duration,
    pub average_duration: Duration,
    /// 負の値はサイズ増加
    pub space_saved: i64,
    /// 変換後 / 変換前（変換なしなら 0）
    pub compression_ratio: f64,
    /// エラーメッセージごとの件数
    pub failure_reasons: BTreeMap<String, usize>,
}

impl StatisticsReport {
    /// 1秒あたりの変換件数
    pub fn files_per_second(&self) -> Option<f64> {
        let seconds = self.total_duration.as_secs_f64();
        (self.converted_files > 0 && seconds > 0.0).then(|| self.converted_files as f64 / seconds)
    }
}

fn round_millis(duration: Duration) -> Duration {
    Duration::from_millis(((duration.as_micros() + 500) / 1000) as u64)
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n📊 CONVERSION REPORT")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "✅ Converted: {}", self.converted_files)?;
        writeln!(f, "⏭️  Skipped: {}", self.skipped_files)?;
        writeln!(f, "❌ Failed: {}", self.failed_files)?;
        writeln!(f, "📁 Total processed: {}", self.total_files)?;

        if self.total_size_before > 0 {
            writeln!(f, "\n💾 SIZE ANALYSIS")?;
            writeln!(f, "Original size: {}", format_bytes(self.total_size_before))?;
            writeln!(f, "New size: {}", format_bytes(self.total_size_after))?;
            if self.space_saved > 0 {
                writeln!(
                    f,
                    "💰 Space saved: {} ({:.1}% reduction)",
                    format_bytes(self.space_saved.unsigned_abs()),
                    (1.0 - self.compression_ratio) * 100.0
                )?;
            } else if self.space_saved < 0 {
                writeln!(
                    f,
                    "📈 Size increased: {}",
                    format_bytes(self.space_saved.unsigned_abs())
                )?;
            }
        }

        writeln!(f, "\n⏱️  PERFORMANCE")?;
        writeln!(f, "Total time: {:?}", round_millis(self.total_duration))?;
        writeln!(f, "Average per file: {:?}", round_millis(self.average_duration))?;
        if let Some(rate) = self.files_per_second() {
            writeln!(f, "Processing rate: {rate:.1} files/sec")?;
        }

        if !self.failure_reasons.is_empty() {
            writeln!(f, "\n🔍 FAILURE ANALYSIS")?;
            for (reason, count) in &self.failure_reasons {
                writeln!(f, "  • {reason}: {count} files")?;
            }
        }
        Ok(())
    }
}

/// 1024単位の人間向け表記
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut divisor = UNIT;
    let mut exponent = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        divisor *= UNIT;
        exponent += 1;
        n /= UNIT;
    }

    let prefix = b"KMGTPE"[exponent] as char;
    format!("{:.1} {prefix}B", bytes as f64 / divisor as f64)
}
