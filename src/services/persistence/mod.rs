// セッション状態の永続化
// 中断したバッチ変換を再開するためのチェックポイント

pub mod implementations;

// 公開API
pub use implementations::{default_state_path, JsonCheckpointStore, MemoryCheckpointStore};
