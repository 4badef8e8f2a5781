// 一時ファイル経由のアトミックな書き込み

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn temp_in_parent(destination: &Path) -> io::Result<NamedTempFile> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new().prefix(".tmp_").tempfile_in(parent)
}

/// 同じディレクトリの一時ファイルに書いてからrenameする
///
/// 途中で失敗した場合、一時ファイルはdropで削除され、書きかけのファイルは残らない。
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = temp_in_parent(destination)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

/// ファイルをバイト単位でアトミックにコピー
pub fn copy_atomic(source: &Path, destination: &Path) -> io::Result<u64> {
    let mut input = File::open(source)?;
    let mut temp = temp_in_parent(destination)?;
    let copied = io::copy(&mut input, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| e.error)?;
    Ok(copied)
}
