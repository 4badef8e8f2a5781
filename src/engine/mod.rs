// エンジン層 - 並列処理とオーケストレーション
// サービス層を組み合わせて1回の変換セッションを実行する

pub mod cancel;
pub mod dispatcher;
pub mod processing_engine;
pub mod rate_limit;
pub mod worker_pool;

// 公開API
pub use cancel::CancelSignal;
pub use processing_engine::{ProcessingEngine, ProcessingSummary};
pub use rate_limit::RateLimiter;
pub use worker_pool::{JobSubmitter, WorkerPool};
