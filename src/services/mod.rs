// サービス層 - 機能別のビジネスロジック
// 各サービスは特定の責任を持ち、疎結合で設計されている

pub mod atomic;
pub mod cache;
pub mod collector;
pub mod config;
pub mod converter;
pub mod monitoring;
pub mod path_resolver;
pub mod persistence;
pub mod stats;
pub mod validator;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use cache::{CacheEntry, ConversionCache, Fingerprint, ResultCache};
pub use collector::{CollectorOptions, FileCollector};
pub use config::{AppConfig, BatchConfig, DefaultProcessingConfig};
pub use converter::{ConvertOptions, Converter};
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter};
pub use path_resolver::PathResolver;
pub use persistence::{JsonCheckpointStore, MemoryCheckpointStore};
pub use stats::{ConversionStatistics, StatisticsReport};
pub use validator::validate_inputs;
