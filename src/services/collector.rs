// Collector - 入力ディレクトリから変換対象ファイルを収集

use crate::core::{FileRecord, ProcessingError, ProcessingResult};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// ファイル収集の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    pub extensions: Vec<String>,
    pub recursive: bool,
    /// 0 は無制限
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            extensions: ["png", "jpg", "jpeg", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            recursive: true,
            max_depth: 0,
            follow_symlinks: false,
        }
    }
}

pub struct FileCollector {
    options: CollectorOptions,
    extensions: HashSet<String>,
}

impl FileCollector {
    pub fn new(options: CollectorOptions) -> Self {
        let extensions = options
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            options,
            extensions,
        }
    }

    /// 設定に従って対象ファイルを収集（パス順にソート済み）
    ///
    /// ルートは絶対パスに正規化され、各レコードのパスも絶対パスになる。
    /// ルート自体が開けない場合のみエラー。個別のアクセス失敗は警告してスキップする。
    pub fn collect(&self, root: &Path) -> ProcessingResult<Vec<FileRecord>> {
        let root = fs::canonicalize(root).map_err(|e| ProcessingError::file_discovery(root, e))?;
        let mut records = if self.options.recursive {
            self.collect_recursive(&root)?
        } else {
            self.collect_immediate(&root)?
        };
        records.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(root = %root.display(), count = records.len(), "Collected files");
        for (directory, count) in directory_stats(&records) {
            debug!(directory = %directory.display(), count, "Files per directory");
        }
        Ok(records)
    }

    fn collect_recursive(&self, root: &Path) -> ProcessingResult<Vec<FileRecord>> {
        let metadata = fs::metadata(root).map_err(|e| ProcessingError::file_discovery(root, e))?;
        if !metadata.is_dir() {
            return Err(ProcessingError::invalid_input(
                "input_dir",
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut walker = WalkDir::new(root).follow_links(self.options.follow_symlinks);
        if self.options.max_depth > 0 {
            // walkdirの深さはルート直下が1、区切り文字数は0
            walker = walker.max_depth(self.options.max_depth + 1);
        }

        let mut records = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(ProcessingError::file_discovery(root, err.into()));
                    }
                    warn!(
                        path = ?err.path(),
                        error = %err,
                        "Error accessing path, skipping"
                    );
                    continue;
                }
            };

            if entry.path_is_symlink() && !self.options.follow_symlinks {
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "Could not read file info, skipping");
                    continue;
                }
            };

            if let Some(record) = self.make_record(root, entry.path(), size) {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn collect_immediate(&self, root: &Path) -> ProcessingResult<Vec<FileRecord>> {
        let entries = fs::read_dir(root).map_err(|e| ProcessingError::file_discovery(root, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "Error reading directory entry, skipping");
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not read file type, skipping");
                    continue;
                }
            };
            if file_type.is_symlink() && !self.options.follow_symlinks {
                continue;
            }

            // シンボリックリンクはリンク先のメタデータで判定
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not read file info, skipping");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            if let Some(record) = self.make_record(root, &path, metadata.len()) {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn make_record(&self, root: &Path, path: &Path, size: u64) -> Option<FileRecord> {
        let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
        if !self.extensions.contains(&extension) {
            return None;
        }

        let relative_path = match path.strip_prefix(root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => {
                warn!(path = %path.display(), "Could not calculate relative path");
                PathBuf::from(path.file_name()?)
            }
        };

        if !is_safe_relative_path(&relative_path) {
            warn!(path = %path.display(), "Skipping invalid path");
            return None;
        }

        if self.options.max_depth > 0 && path_depth(&relative_path) > self.options.max_depth {
            return None;
        }

        Some(FileRecord {
            path: path.to_path_buf(),
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            relative_path,
            extension,
            size,
        })
    }
}

/// 親ディレクトリへの遡り（`..`）や絶対パスを含まないこと
pub fn is_safe_relative_path(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// 相対パス中の区切り文字の数
pub fn path_depth(relative: &Path) -> usize {
    relative
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
        .saturating_sub(1)
}

/// ディレクトリごとのファイル数
pub fn directory_stats(records: &[FileRecord]) -> BTreeMap<PathBuf, usize> {
    let mut stats = BTreeMap::new();
    for record in records {
        *stats.entry(record.directory.clone()).or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup_tree(root: &Path) {
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.png"), b"dummy").unwrap();
        fs::write(root.join("TOP2.JPG"), b"dummy").unwrap();
        fs::write(root.join("notes.txt"), b"dummy").unwrap();
        fs::write(root.join("a/one.webp"), b"dummy").unwrap();
        fs::write(root.join("a/b/two.jpeg"), b"dummy").unwrap();
        fs::write(root.join("a/b/c/three.png"), b"dummy").unwrap();
    }

    fn names(records: &[FileRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.relative_path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_recursive_collects_matching_extensions() {
        let temp_dir = tempdir().unwrap();
        setup_tree(temp_dir.path());
        let root = temp_dir.path().canonicalize().unwrap();

        let collector = FileCollector::new(CollectorOptions::default());
        let records = collector.collect(temp_dir.path()).unwrap();

        assert_eq!(
            names(&records),
            vec!["TOP2.JPG", "a/b/c/three.png", "a/b/two.jpeg", "a/one.webp", "top.png"]
        );
        let upper = records.iter().find(|r| r.path.ends_with("TOP2.JPG")).unwrap();
        assert_eq!(upper.extension, "jpg");
        assert_eq!(upper.size, 5);
        assert_eq!(upper.directory, root);
    }

    #[test]
    fn test_non_recursive_reads_only_immediate_children() {
        let temp_dir = tempdir().unwrap();
        setup_tree(temp_dir.path());

        let collector = FileCollector::new(CollectorOptions {
            recursive: false,
            ..CollectorOptions::default()
        });
        let records = collector.collect(temp_dir.path()).unwrap();

        assert_eq!(names(&records), vec!["TOP2.JPG", "top.png"]);
    }

    #[test]
    fn test_max_depth_limits_separator_count() {
        let temp_dir = tempdir().unwrap();
        setup_tree(temp_dir.path());

        let collector = FileCollector::new(CollectorOptions {
            max_depth: 1,
            ..CollectorOptions::default()
        });
        let records = collector.collect(temp_dir.path()).unwrap();

        assert_eq!(names(&records), vec!["TOP2.JPG", "a/one.webp", "top.png"]);
    }

    #[test]
    fn test_custom_extension_set() {
        let temp_dir = tempdir().unwrap();
        setup_tree(temp_dir.path());

        let collector = FileCollector::new(CollectorOptions {
            extensions: vec![".PNG".to_string()],
            ..CollectorOptions::default()
        });
        let records = collector.collect(temp_dir.path()).unwrap();

        assert_eq!(names(&records), vec!["a/b/c/three.png", "top.png"]);
    }

    #[test]
    fn test_missing_root_is_hard_error() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");

        for recursive in [true, false] {
            let collector = FileCollector::new(CollectorOptions {
                recursive,
                ..CollectorOptions::default()
            });
            let error = collector.collect(&missing).unwrap_err();
            assert!(matches!(error, ProcessingError::FileDiscovery { .. }));
        }
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let collector = FileCollector::new(CollectorOptions::default());
        assert!(collector.collect(temp_dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let temp_dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("linked.png"), b"dummy").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("linked.png"),
            temp_dir.path().join("link.png"),
        )
        .unwrap();
        fs::write(temp_dir.path().join("real.png"), b"dummy").unwrap();

        let collector = FileCollector::new(CollectorOptions::default());
        assert_eq!(names(&collector.collect(temp_dir.path()).unwrap()), vec!["real.png"]);

        let collector = FileCollector::new(CollectorOptions {
            follow_symlinks: true,
            ..CollectorOptions::default()
        });
        assert_eq!(
            names(&collector.collect(temp_dir.path()).unwrap()),
            vec!["link.png", "real.png"]
        );
    }

    #[test]
    fn test_path_safety() {
        assert!(is_safe_relative_path(Path::new("a/b/c.png")));
        assert!(is_safe_relative_path(Path::new("./c.png")));
        assert!(!is_safe_relative_path(Path::new("../c.png")));
        assert!(!is_safe_relative_path(Path::new("a/../../c.png")));
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth(Path::new("top.png")), 0);
        assert_eq!(path_depth(Path::new("a/one.png")), 1);
        assert_eq!(path_depth(Path::new("a/b/c/three.png")), 3);
    }

    #[test]
    fn test_directory_stats() {
        let temp_dir = tempdir().unwrap();
        setup_tree(temp_dir.path());

        let collector = FileCollector::new(CollectorOptions::default());
        let records = collector.collect(temp_dir.path()).unwrap();
        let stats = directory_stats(&records);
        let root = temp_dir.path().canonicalize().unwrap();

        assert_eq!(stats.get(&root), Some(&2));
        assert_eq!(stats.get(&root.join("a/b")), Some(&1));
        assert_eq!(stats.values().sum::<usize>(), 5);
    }

    #[test]
    fn test_relative_root_yields_absolute_paths() {
        // カレントディレクトリ直下に作り、相対パスで渡す
        let temp_dir = tempfile::Builder::new()
            .prefix("collect_rel_")
            .tempdir_in(".")
            .unwrap();
        fs::write(temp_dir.path().join("a.png"), b"dummy").unwrap();
        let relative_root = Path::new(".").join(temp_dir.path().file_name().unwrap());
        assert!(relative_root.is_relative());

        let collector = FileCollector::new(CollectorOptions::default());
        let records = collector.collect(&relative_root).unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].path.is_absolute());
        assert!(records[0].directory.is_absolute());
        assert_eq!(records[0].relative_path, PathBuf::from("a.png"));
        assert_eq!(
            records[0].path,
            temp_dir.path().canonicalize().unwrap().join("a.png")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.png"), b"dummy").unwrap();
        fs::write(temp_dir.path().join("visible.png"), b"dummy").unwrap();
        fs::create_dir(temp_dir.path().join("open")).unwrap();
        fs::write(temp_dir.path().join("open/sibling.jpg"), b"dummy").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // root権限では権限を無視して読めてしまう
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let collector = FileCollector::new(CollectorOptions::default());
        let result = collector.collect(temp_dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(names(&result.unwrap()), vec!["open/sibling.jpg", "visible.png"]);
    }
}
