// 変換処理に関連するデータ型定義

use super::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 出力フォーマット
///
/// `jpg` と `jpeg` は出力拡張子としては区別するが、
/// 「変換済みかどうか」の判定では同一フォーマットとして扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Png, Self::Jpg, Self::Jpeg, Self::Webp];

    /// 出力ファイルに付ける拡張子
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    pub const fn is_jpeg(&self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg)
    }

    /// 既にこのフォーマットの拡張子かどうか（jpg/jpeg同一視）
    pub fn matches_extension(&self, extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        if ext == self.extension() {
            return true;
        }
        self.is_jpeg() && (ext == "jpg" || ext == "jpeg")
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" => Ok(Self::Jpg),
            "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(ConvertError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 収集されたファイルの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// 入力ルートからの相対パス
    pub relative_path: PathBuf,
    pub directory: PathBuf,
    /// 小文字の拡張子
    pub extension: String,
    pub size: u64,
}

/// ワーカーに渡す変換ジョブ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    pub format: OutputFormat,
    /// 事前に解決された出力先（None の場合はソースの拡張子を置換）
    pub output_path: Option<PathBuf>,
}

impl Job {
    pub fn new(source: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            source: source.into(),
            format,
            output_path: None,
        }
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    /// 実際に書き込む出力先
    pub fn destination(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.source.with_extension(self.format.extension()),
        }
    }
}

/// 1ジョブの変換結果
///
/// 失敗なしで `new_size == 0` の場合はスキップ（既に対象フォーマット等）を意味する。
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub original_path: PathBuf,
    pub new_path: Option<PathBuf>,
    pub original_size: u64,
    pub new_size: u64,
    pub duration: Duration,
    pub error: Option<ConvertError>,
}

/// 結果の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Converted,
    Skipped,
    Failed,
}

impl ConversionResult {
    pub fn new(original_path: impl Into<PathBuf>) -> Self {
        Self {
            original_path: original_path.into(),
            new_path: None,
            original_size: 0,
            new_size: 0,
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub fn failed(original_path: impl Into<PathBuf>, error: ConvertError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(original_path)
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_skip(&self) -> bool {
        self.error.is_none() && self.new_size == 0
    }

    pub fn status(&self) -> ResultStatus {
        if self.is_failure() {
            ResultStatus::Failed
        } else if self.is_skip() {
            ResultStatus::Skipped
        } else {
            ResultStatus::Converted
        }
    }
}
