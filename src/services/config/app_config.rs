// アプリ設定（TOMLで永続化）

use super::implementations::DefaultProcessingConfig;
use crate::codec::PngCompression;
use crate::core::{OutputFormat, ProcessingError, ProcessingResult};
use crate::services::atomic::write_atomic;
use crate::services::collector::CollectorOptions;
use crate::services::converter::ConvertOptions;
use crate::services::path_resolver::PathResolver;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR_NAME: &str = ".image_convert";
const CONFIG_FILE_NAME: &str = "config.toml";

/// ユーザーごとのアプリディレクトリ `<home>/.image_convert`
pub fn app_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// 出力コーデックの設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub png_compression: PngCompression,
}

/// バッチ処理（ディレクトリ走査と出力レイアウト）の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub recursive: bool,
    /// 0 は無制限
    pub max_depth: usize,
    pub preserve_structure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// 既存の設定ファイルとの互換のために保持するのみで、動作には影響しない。
    /// 出力ディレクトリは変換したファイルごとに作られるため、空のディレクトリは生じない。
    pub skip_empty_dirs: bool,
    pub follow_symlinks: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0,
            preserve_structure: true,
            output_dir: None,
            skip_empty_dirs: true,
            follow_symlinks: false,
        }
    }
}

/// 設定ファイル全体
///
/// 欠けているキーは既定値で補う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_format: OutputFormat,
    pub quality: u8,
    pub workers: usize,
    /// 0 はリサイズなし
    pub max_dimension: u32,
    pub log_level: String,
    pub extensions: Vec<String>,
    pub auto_backup: bool,
    pub resume_enabled: bool,
    pub keep_original: bool,
    pub dry_run: bool,
    pub output: OutputSettings,
    pub batch: BatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Png,
            quality: 80,
            workers: num_cpus::get().max(1),
            max_dimension: 0,
            log_level: "info".to_string(),
            extensions: ["png", "jpg", "jpeg", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auto_backup: false,
            resume_enabled: true,
            keep_original: false,
            dry_run: false,
            output: OutputSettings::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<home>/.image_convert/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(app_dir()?.join(CONFIG_FILE_NAME))
    }

    /// 設定ファイルを読み込む。無ければ既定値で作成する。
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!(path = %path.display(), "Created default configuration");
            return Ok(config);
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let data = toml::to_string_pretty(self).context("Failed to serialize config")?;
        write_atomic(path, data.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// 値の範囲チェック
    pub fn validate(&self) -> ProcessingResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(ProcessingError::configuration(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.extensions.is_empty() {
            return Err(ProcessingError::configuration("extensions must not be empty"));
        }
        Ok(())
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            extensions: self.extensions.clone(),
            recursive: self.batch.recursive,
            max_depth: self.batch.max_depth,
            follow_symlinks: self.batch.follow_symlinks,
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            quality: self.quality,
            max_dimension: self.max_dimension,
            keep_original: self.keep_original,
            dry_run: self.dry_run,
            backup: self.auto_backup,
            png_compression: self.output.png_compression,
        }
    }

    pub fn path_resolver(&self) -> PathResolver {
        PathResolver::new(self.batch.output_dir.clone(), self.batch.preserve_structure)
    }

    pub fn processing_config(&self, rate_limit: Option<f64>) -> DefaultProcessingConfig {
        DefaultProcessingConfig::new(self.workers).with_rate_limit(rate_limit)
    }
}
