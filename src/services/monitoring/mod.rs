// 進捗監視機能
// 開始通知、1ファイルごとの結果表示、完了通知

pub mod implementations;

// 公開API
pub use implementations::{ConsoleProgressReporter, NoOpProgressReporter};
