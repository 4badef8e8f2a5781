// ワーカープール設定の具象実装

use crate::core::ProcessingConfig;
use std::time::Duration;

/// 結果待ちで警告を出すまでの時間
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// デフォルト設定実装
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultProcessingConfig {
    worker_count: usize,
    buffer_size: usize,
    rate_limit: Option<f64>,
    idle_timeout: Duration,
}

impl DefaultProcessingConfig {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            worker_count,
            buffer_size: worker_count * 2,
            rate_limit: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// 0以下・非有限の値は無制限として扱う
    pub fn with_rate_limit(mut self, rate_limit: Option<f64>) -> Self {
        self.rate_limit = rate_limit.filter(|r| r.is_finite() && *r > 0.0);
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

impl Default for DefaultProcessingConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl ProcessingConfig for DefaultProcessingConfig {
    fn worker_count(&self) -> usize {
        self.worker_count
    }

    // キュー容量は常にワーカー数の2倍以上
    fn channel_buffer_size(&self) -> usize {
        self.buffer_size.max(self.worker_count * 2)
    }

    fn rate_limit(&self) -> Option<f64> {
        self.rate_limit
    }

    fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}
