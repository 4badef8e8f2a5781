use crate::services::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "image_convert")]
#[command(about = "Parallel batch image converter with resume support (PNG, JPEG, WebP)")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.image_convert/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Save logs to ~/.image_convert/logs/image_convert.log
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert every image under a directory to the target format
    Convert(ConvertArgs),

    /// Resume the previously interrupted conversion session
    Resume(ResumeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Path to the image folder
    #[arg(short = 'p', long = "path")]
    pub path: PathBuf,

    /// Target format: png, jpg, jpeg, webp (default from config)
    #[arg(short = 't', long = "to")]
    pub to: Option<String>,

    /// Keep original images after conversion
    #[arg(long)]
    pub keep: bool,

    /// Preview changes without converting
    #[arg(long)]
    pub dry_run: bool,

    /// Output quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Maximum width/height in pixels (0 = no limit)
    #[arg(long = "max-size")]
    pub max_size: Option<u32>,

    /// Number of parallel workers (default: CPU count)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Conversions started per second (default: no limit)
    #[arg(long)]
    pub rate_limit: Option<f64>,

    /// Copy originals into a backup/ folder before converting
    #[arg(long)]
    pub backup: bool,

    /// Write outputs under this directory, mirroring the input tree
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Only convert files directly inside the folder
    #[arg(long)]
    pub no_recursive: bool,

    /// Maximum directory depth below the folder (0 = unlimited)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Write every output into the input folder itself
    #[arg(long)]
    pub flatten: bool,

    /// Follow symbolic links while collecting files
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Suppress per-file progress output
    #[arg(long)]
    pub quiet: bool,
}

impl ConvertArgs {
    /// 指定されたフラグで設定値を上書き
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(max_size) = self.max_size {
            config.max_dimension = max_size;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(output_dir) = &self.output_dir {
            config.batch.output_dir = Some(output_dir.clone());
        }
        if let Some(max_depth) = self.max_depth {
            config.batch.max_depth = max_depth;
        }
        config.keep_original |= self.keep;
        config.dry_run |= self.dry_run;
        config.auto_backup |= self.backup;
        config.batch.follow_symlinks |= self.follow_symlinks;
        if self.no_recursive {
            config.batch.recursive = false;
        }
        if self.flatten {
            config.batch.preserve_structure = false;
        }
    }

    /// 変換先フォーマット（未指定なら設定の既定値）
    pub fn target_format(&self, config: &AppConfig) -> String {
        self.to
            .clone()
            .unwrap_or_else(|| config.default_format.to_string())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResumeArgs {
    /// Number of parallel workers (default: from config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Conversions started per second (default: no limit)
    #[arg(long)]
    pub rate_limit: Option<f64>,

    /// Keep original images after conversion
    #[arg(long)]
    pub keep: bool,

    /// Suppress per-file progress output
    #[arg(long)]
    pub quiet: bool,
}

impl ResumeArgs {
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.keep_original |= self.keep;
    }
}
