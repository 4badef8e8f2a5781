// コーデック層 - 画像のヘッダー読み取り・デコード・エンコードの抽象化

use crate::core::OutputFormat;
use anyhow::Result;
use image::DynamicImage;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod standard;

/// PNG出力の圧縮レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PngCompression {
    #[default]
    BestSpeed,
    Default,
    BestCompression,
}

/// エンコード時の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodeSettings {
    /// JPEG品質 (1-100)
    pub quality: u8,
    pub png_compression: PngCompression,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            quality: 80,
            png_compression: PngCompression::BestSpeed,
        }
    }
}

/// 画像コーデックのトレイト
///
/// デコード・エンコードの実体は外部ライブラリに任せ、
/// 変換処理はこのトレイト経由でのみ呼び出す。
#[automock]
pub trait ImageCodec: Send + Sync {
    /// ヘッダーだけを読んで画像サイズを取得（フルデコードしない）
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// ファイルをラスタにデコード
    fn decode(&self, path: &Path) -> Result<DynamicImage>;

    /// ラスタを指定フォーマットのバイト列にエンコード
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>>;
}
