//! 画像フォーマットの並列バッチ変換
//!
//! ディレクトリ内の画像を収集し、固定数のワーカーで並列に変換する。
//! 進捗はチェックポイントとして保存され、中断したセッションは再開できる。

pub mod cli;
pub mod codec;
pub mod core;
pub mod engine;
pub mod logging;
pub mod services;

pub use crate::core::{
    ConversionResult, ConvertError, FileRecord, Job, OutputFormat, ProcessingError,
    ProcessingResult, SessionState,
};
pub use engine::{CancelSignal, ProcessingEngine, ProcessingSummary, WorkerPool};
pub use services::{AppConfig, ConvertOptions, Converter};
