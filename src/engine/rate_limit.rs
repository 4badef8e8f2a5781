// レートリミッター
// 全ワーカー共通で、1秒あたりの変換開始数を制限する

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// バースト1のトークンバケット
///
/// トークンが無い場合は次の枠まで待機する（再キューはしない）。
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 0以下・非有限の値では作成しない（制限なし）
    pub fn new(per_second: f64) -> Option<Self> {
        if !per_second.is_finite() || per_second <= 0.0 {
            return None;
        }
        Some(Self {
            per_second,
            interval: Duration::from_secs_f64(1.0 / per_second),
            next_slot: Mutex::new(None),
        })
    }

    pub fn per_second(&self) -> f64 {
        self.per_second
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// トークンを1つ取得するまで待機
    ///
    /// 枠は呼び出し時点で予約される。待機中にキャンセルされても枠は戻らない。
    pub async fn acquire(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}
