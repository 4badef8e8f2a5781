// 出力先パスの解決

use crate::core::OutputFormat;
use std::io;
use std::path::{Path, PathBuf};

/// 出力レイアウトの設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResolver {
    output_dir: Option<PathBuf>,
    preserve_structure: bool,
}

impl PathResolver {
    pub fn new(output_dir: Option<PathBuf>, preserve_structure: bool) -> Self {
        Self {
            output_dir,
            preserve_structure,
        }
    }

    /// 出力先を計算する
    ///
    /// 優先順位: 出力ルート指定 → 構造維持（元ディレクトリで拡張子置換） → 入力ルートへフラット化
    pub fn resolve(&self, input_root: &Path, source: &Path, format: OutputFormat) -> PathBuf {
        let relative = source
            .strip_prefix(input_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default());
        let renamed = relative.with_extension(format.extension());

        if let Some(output_dir) = &self.output_dir {
            return output_dir.join(renamed);
        }

        if self.preserve_structure {
            return input_root.join(renamed);
        }

        match renamed.file_name() {
            Some(name) => input_root.join(name),
            None => input_root.join(renamed),
        }
    }

    /// 出力先の親ディレクトリを作成
    pub fn ensure_parent(destination: &Path) -> io::Result<()> {
        match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// 解決と親ディレクトリ作成をまとめて行う
    pub fn prepare(
        &self,
        input_root: &Path,
        source: &Path,
        format: OutputFormat,
    ) -> io::Result<PathBuf> {
        let destination = self.resolve(input_root, source, format);
        Self::ensure_parent(&destination)?;
        Ok(destination)
    }
}
