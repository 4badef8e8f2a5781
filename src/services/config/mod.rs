// 設定管理機能
// 永続化されたアプリ設定と、各コンポーネントに渡す設定値

pub mod app_config;
pub mod implementations;

// 公開API
pub use app_config::{app_dir, AppConfig, BatchConfig, OutputSettings};
pub use implementations::DefaultProcessingConfig;
