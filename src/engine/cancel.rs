// キャンセル信号
// 全ワーカー・ディスパッチャーで共有する協調的なキャンセル

use std::sync::Arc;
use tokio::sync::watch;

/// 一度立てたら戻らないキャンセルフラグ
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// キャンセルされるまで待機（既にキャンセル済みなら即座に戻る）
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // 送信側はself自身が保持しているため、Errにはならない
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
