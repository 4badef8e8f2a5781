// 入力検証（処理開始前に行う）

use crate::core::{OutputFormat, ProcessingError, ProcessingResult};
use std::fs;
use std::path::Path;

/// 入力ディレクトリと変換先フォーマットを検証する
///
/// 失敗した場合は一切の処理を始めずに中断する。
pub fn validate_inputs(
    input_dir: &Path,
    target_format: &str,
    extensions: &[String],
) -> ProcessingResult<OutputFormat> {
    if input_dir.as_os_str().is_empty() {
        return Err(ProcessingError::invalid_input("input_dir", "path is required"));
    }

    let metadata = fs::metadata(input_dir).map_err(|e| {
        ProcessingError::invalid_input(
            "input_dir",
            format!("{} is not accessible: {e}", input_dir.display()),
        )
    })?;
    if !metadata.is_dir() {
        return Err(ProcessingError::invalid_input(
            "input_dir",
            format!("{} is not a directory", input_dir.display()),
        ));
    }
    fs::read_dir(input_dir).map_err(|e| {
        ProcessingError::invalid_input(
            "input_dir",
            format!("{} is not readable: {e}", input_dir.display()),
        )
    })?;

    let format: OutputFormat = target_format
        .parse()
        .map_err(|_| ProcessingError::unsupported_format(target_format))?;

    let listed = extensions
        .iter()
        .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(format.extension()));
    if !listed {
        return Err(ProcessingError::unsupported_format(target_format));
    }

    Ok(format)
}
