// 変換処理専用のカスタムエラー型定義
// ファイル単位のエラーとセッション全体のエラーを分離する

use std::path::PathBuf;
use thiserror::Error;

/// ファイル単位の変換エラー
///
/// バッチ全体を中断させず、`ConversionResult` の中に格納される。
/// `Display` の文字列はレポートの失敗理由ヒストグラムのキーになる。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("failed to stat file: {0}")]
    Stat(String),

    #[error("file already in target format")]
    AlreadyInFormat,

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to probe image dimensions: {0}")]
    Probe(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("backup failed: {0}")]
    Backup(String),

    #[error("failed to write output: {0}")]
    Write(String),

    #[error("failed to remove original: {0}")]
    RemoveOriginal(String),

    #[error("worker failure: {0}")]
    Internal(String),
}

impl ConvertError {
    /// スキップ扱いになるエラーかどうか
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::AlreadyInFormat)
    }
}

/// セッション全体に関わるエラー型
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("入力エラー: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("未対応のフォーマット: {format}")]
    UnsupportedFormat { format: String },

    #[error("ファイル発見エラー: {} - {source}", path.display())]
    FileDiscovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("チェックポイントエラー: {source}")]
    Checkpoint {
        #[source]
        source: anyhow::Error,
    },

    #[error("タスクエラー: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("ワーカープールは既に停止しています")]
    PoolClosed,
}

impl ProcessingError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn file_discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileDiscovery {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn checkpoint(source: anyhow::Error) -> Self {
        Self::Checkpoint { source }
    }

    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::Task { source }
    }

    /// 処理開始前に中断すべきエラーかどうか
    ///
    /// チェックポイントの永続化失敗は警告扱いで、実行は継続する。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Checkpoint { .. })
    }
}

/// 変換セッション用のResult型エイリアス
pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_error_messages_are_stable_keys() {
        assert_eq!(
            ConvertError::AlreadyInFormat.to_string(),
            "file already in target format"
        );
        assert_eq!(
            ConvertError::Decode("bad header".to_string()).to_string(),
            "failed to decode image: bad header"
        );
        assert_eq!(
            ConvertError::RemoveOriginal("permission denied".to_string()).to_string(),
            "failed to remove original: permission denied"
        );
    }

    #[test]
    fn test_only_already_in_format_is_skip() {
        assert!(ConvertError::AlreadyInFormat.is_skip());
        assert!(!ConvertError::Encode("x".to_string()).is_skip());
        assert!(!ConvertError::Stat("x".to_string()).is_skip());
    }

    #[test]
    fn test_processing_error_fatality() {
        assert!(ProcessingError::invalid_input("input_dir", "missing").is_fatal());
        assert!(ProcessingError::unsupported_format("bmp").is_fatal());
        assert!(ProcessingError::configuration("workers must be > 0").is_fatal());
        assert!(!ProcessingError::checkpoint(anyhow::anyhow!("disk full")).is_fatal());
        assert!(ProcessingError::PoolClosed.is_fatal());
    }

    #[test]
    fn test_processing_error_display() {
        let error = ProcessingError::invalid_input("input_dir", "does not exist");
        assert_eq!(error.to_string(), "入力エラー: input_dir - does not exist");

        let error = ProcessingError::file_discovery(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(error.to_string().contains("/missing"));
    }
}
