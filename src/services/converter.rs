// Converter - 単一ファイルの変換処理

use super::atomic::{copy_atomic, write_atomic};
use super::cache::{lookup_valid, CacheEntry, ConversionCache, Fingerprint, ResultCache};
use super::path_resolver::PathResolver;
use crate::codec::{EncodeSettings, ImageCodec, PngCompression};
use crate::core::{ConversionResult, ConvertError, Job, JobProcessor};
use image::imageops::FilterType;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const BACKUP_DIR_NAME: &str = "backup";
const BACKUP_SUFFIX: &str = ".bak";

/// 変換処理の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub quality: u8,
    /// 0 はリサイズなし
    pub max_dimension: u32,
    pub keep_original: bool,
    pub dry_run: bool,
    pub backup: bool,
    pub png_compression: PngCompression,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            quality: 80,
            max_dimension: 0,
            keep_original: false,
            dry_run: false,
            backup: false,
            png_compression: PngCompression::default(),
        }
    }
}

impl ConvertOptions {
    /// 出力結果に影響する設定のハッシュ
    pub fn settings_hash(&self) -> String {
        let settings = format!(
            "{}_{}_{:?}",
            self.quality, self.max_dimension, self.png_compression
        );
        blake3::hash(settings.as_bytes()).to_hex()[..16].to_string()
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            quality: self.quality,
            png_compression: self.png_compression,
        }
    }
}

/// 最大辺を `max_dimension` に収める縮小後サイズ（不要なら None）
///
/// 長い方の辺を固定し、もう一方を比率から計算する。
pub fn resize_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if max_dimension == 0 || width.max(height) <= max_dimension {
        return None;
    }

    let max = f64::from(max_dimension);
    if width >= height {
        let scaled = (f64::from(height) * max / f64::from(width)).round().max(1.0);
        Some((max_dimension, scaled as u32))
    } else {
        let scaled = (f64::from(width) * max / f64::from(height)).round().max(1.0);
        Some((scaled as u32, max_dimension))
    }
}

/// 元ファイル横の `backup/` に `<name>.bak` としてコピー
pub fn create_backup(source: &Path) -> std::io::Result<PathBuf> {
    let directory = source.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = directory.join(BACKUP_DIR_NAME);
    fs::create_dir_all(&backup_dir)?;

    let mut file_name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    file_name.push(BACKUP_SUFFIX);
    let backup_path = backup_dir.join(file_name);

    copy_atomic(source, &backup_path)?;
    Ok(backup_path)
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

// ヒストグラムのキーがファイルごとにばらけないよう、根本原因のみを使う
fn root_cause(error: &anyhow::Error) -> String {
    error.root_cause().to_string()
}

/// フォーマット変換器
///
/// キャッシュは全ワーカーで共有される。
pub struct Converter<C> {
    codec: C,
    options: ConvertOptions,
    settings_hash: String,
    cache: Arc<dyn ConversionCache>,
}

impl<C: ImageCodec> Converter<C> {
    pub fn new(codec: C, options: ConvertOptions) -> Self {
        Self::with_cache(codec, options, Arc::new(ResultCache::new()))
    }

    pub fn with_cache(codec: C, options: ConvertOptions, cache: Arc<dyn ConversionCache>) -> Self {
        let settings_hash = options.settings_hash();
        Self {
            codec,
            options,
            settings_hash,
            cache,
        }
    }

    /// 1ジョブを変換する。エラーは全て結果に格納される。
    pub fn convert(&self, job: &Job) -> ConversionResult {
        let start_time = Instant::now();
        let mut result = ConversionResult::new(&job.source);

        match self.run(job, &mut result) {
            Ok(()) => {}
            Err(error) if error.is_skip() => {
                debug!(path = %job.source.display(), format = %job.format, "Already in target format");
                result.new_path = None;
                result.new_size = 0;
            }
            Err(error) => result.error = Some(error),
        }

        result.duration = start_time.elapsed();
        result
    }

    fn run(&self, job: &Job, result: &mut ConversionResult) -> Result<(), ConvertError> {
        let metadata =
            fs::metadata(&job.source).map_err(|e| ConvertError::Stat(e.to_string()))?;
        result.original_size = metadata.len();
        let source_modified = metadata
            .modified()
            .map_err(|e| ConvertError::Stat(e.to_string()))?;

        if job.format.matches_extension(&lowercase_extension(&job.source)) {
            return Err(ConvertError::AlreadyInFormat);
        }

        let destination = job.destination();
        result.new_path = Some(destination.clone());

        let key = Fingerprint::new(&job.source, job.format, &self.settings_hash);
        if let Some(entry) = lookup_valid(
            self.cache.as_ref(),
            &key,
            source_modified,
            &self.settings_hash,
        ) {
            debug!(path = %job.source.display(), "Cache hit");
            result.new_size = entry.output_size;
            return Ok(());
        }

        if self.options.dry_run {
            let needs_resize = self.needs_resize(&job.source)?;
            debug!(
                path = %job.source.display(),
                destination = %destination.display(),
                needs_resize,
                "[DRY-RUN] Would convert"
            );
            return Ok(());
        }

        let dimensions = if self.options.max_dimension > 0 {
            let dimensions = self
                .codec
                .probe_dimensions(&job.source)
                .map_err(|e| ConvertError::Probe(root_cause(&e)))?;
            Some(dimensions)
        } else {
            None
        };

        let mut image = self
            .codec
            .decode(&job.source)
            .map_err(|e| ConvertError::Decode(root_cause(&e)))?;

        if let Some((width, height)) = dimensions {
            if let Some((new_width, new_height)) =
                resize_dimensions(width, height, self.options.max_dimension)
            {
                image = image.resize_exact(new_width, new_height, FilterType::Lanczos3);
            }
        }

        if self.options.backup {
            create_backup(&job.source).map_err(|e| ConvertError::Backup(e.to_string()))?;
        }

        let bytes = self
            .codec
            .encode(&image, job.format, &self.options.encode_settings())
            .map_err(|e| ConvertError::Encode(root_cause(&e)))?;

        PathResolver::ensure_parent(&destination)
            .map_err(|e| ConvertError::Write(e.to_string()))?;
        write_atomic(&destination, &bytes).map_err(|e| ConvertError::Write(e.to_string()))?;

        result.new_size = fs::metadata(&destination)
            .map_err(|e| ConvertError::Stat(e.to_string()))?
            .len();

        self.cache.put(
            key,
            CacheEntry {
                output_path: destination,
                output_size: result.new_size,
                source_modified,
                settings_hash: self.settings_hash.clone(),
            },
        );

        // 新しいファイルは書き込み済みのままロールバックしない
        if !self.options.keep_original {
            fs::remove_file(&job.source)
                .map_err(|e| ConvertError::RemoveOriginal(e.to_string()))?;
        }

        Ok(())
    }

    fn needs_resize(&self, source: &Path) -> Result<bool, ConvertError> {
        if self.options.max_dimension == 0 {
            return Ok(false);
        }
        let (width, height) = self
            .codec
            .probe_dimensions(source)
            .map_err(|e| ConvertError::Probe(root_cause(&e)))?;
        Ok(width.max(height) > self.options.max_dimension)
    }
}

impl<C: ImageCodec> JobProcessor for Converter<C> {
    fn process(&self, job: &Job) -> ConversionResult {
        self.convert(job)
    }
}
