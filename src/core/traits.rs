// 変換パイプラインのトレイト定義
// 全ての抽象化インターフェースを定義

use super::session::SessionState;
use super::types::{ConversionResult, Job};
use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::time::Duration;

/// ワーカープールの設定を抽象化するトレイト
#[automock]
pub trait ProcessingConfig: Send + Sync {
    /// ワーカー数
    fn worker_count(&self) -> usize;

    /// ジョブキュー・結果チャンネルの容量（ワーカー数の2倍以上）
    fn channel_buffer_size(&self) -> usize;

    /// 1秒あたりの変換開始数の上限（None なら無制限）
    fn rate_limit(&self) -> Option<f64>;

    /// 結果待ちでこの時間を超えたら警告を出す
    fn idle_timeout(&self) -> Duration;
}

/// 1ジョブを処理して結果を返す
///
/// `Converter` が実装する。ワーカープールはこのトレイトだけに依存する。
#[automock]
pub trait JobProcessor: Send + Sync {
    fn process(&self, job: &Job) -> ConversionResult;
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    async fn report_started(&self, total_files: usize);

    /// 1ファイル完了ごとの報告
    async fn report_result(&self, result: &ConversionResult, completed: usize, total: usize);

    /// 処理完了時の報告
    async fn report_completed(&self, converted: usize, skipped: usize, failed: usize);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, total_files: usize) {
        self.as_ref().report_started(total_files).await
    }

    async fn report_result(&self, result: &ConversionResult, completed: usize, total: usize) {
        self.as_ref().report_result(result, completed, total).await
    }

    async fn report_completed(&self, converted: usize, skipped: usize, failed: usize) {
        self.as_ref().report_completed(converted, skipped, failed).await
    }
}

/// セッション状態の永続化トレイト
#[automock]
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// スナップショット全体を上書き保存
    async fn save(&self, state: &SessionState) -> Result<()>;

    /// 最新のスナップショット（無ければ None）
    async fn load(&self) -> Result<Option<SessionState>>;

    /// スナップショットを削除
    async fn clear(&self) -> Result<()>;
}

// CheckpointStore for Box<dyn CheckpointStore>
#[async_trait]
impl CheckpointStore for Box<dyn CheckpointStore> {
    async fn save(&self, state: &SessionState) -> Result<()> {
        self.as_ref().save(state).await
    }

    async fn load(&self) -> Result<Option<SessionState>> {
        self.as_ref().load().await
    }

    async fn clear(&self) -> Result<()> {
        self.as_ref().clear().await
    }
}
