// ログ出力の初期化（tracing）

use crate::services::config::app_dir;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "image_convert.log";

/// `<home>/.image_convert/logs/image_convert.log`
pub fn default_log_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("logs").join(LOG_FILE_NAME))
}

/// 設定のログレベルからフィルターを作る
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid log level: {level}"))
}

/// stderrへの出力と、指定があればファイルへの出力を設定する
///
/// `RUST_LOG` があれば設定値より優先する。戻り値のガードはmainで保持すること。
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(level)?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory: {}", directory.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| LOG_FILE_NAME.into());

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "image_convert=debug"] {
            assert!(build_filter(level).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_default_log_path_layout() {
        if let Ok(path) = default_log_path() {
            assert!(path.ends_with(".image_convert/logs/image_convert.log"));
        }
    }
}
