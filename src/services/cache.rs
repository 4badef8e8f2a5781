// 変換結果キャッシュ
// 同一実行内での再チェック（ドライラン後の再statなど）を省略するためのもの。永続化はしない。

use crate::core::OutputFormat;
use dashmap::DashMap;
use mockall::automock;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// (ソースパス, 出力フォーマット, 設定ハッシュ) から導出するキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(source: &Path, format: OutputFormat, settings_hash: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(format.extension().as_bytes());
        hasher.update(b"\0");
        hasher.update(settings_hash.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub output_path: PathBuf,
    pub output_size: u64,
    /// 変換時点のソース更新時刻
    pub source_modified: SystemTime,
    pub settings_hash: String,
}

/// キャッシュエントリの有効性判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheValidity {
    Valid,
    SourceModified,
    OutputMissing,
    SettingsChanged,
}

impl CacheEntry {
    pub fn validity(&self, source_modified: SystemTime, settings_hash: &str) -> CacheValidity {
        if source_modified > self.source_modified {
            return CacheValidity::SourceModified;
        }
        if !self.output_path.exists() {
            return CacheValidity::OutputMissing;
        }
        if self.settings_hash != settings_hash {
            return CacheValidity::SettingsChanged;
        }
        CacheValidity::Valid
    }
}

/// 並行アクセス可能なキャッシュのインターフェース
///
/// 同じキーへの書き込みは後勝ち。
#[automock]
pub trait ConversionCache: Send + Sync {
    fn get(&self, key: &Fingerprint) -> Option<CacheEntry>;

    fn put(&self, key: Fingerprint, entry: CacheEntry);

    fn invalidate(&self, key: &Fingerprint);
}

/// 有効なエントリだけを返し、無効になったものは削除する
pub fn lookup_valid(
    cache: &dyn ConversionCache,
    key: &Fingerprint,
    source_modified: SystemTime,
    settings_hash: &str,
) -> Option<CacheEntry> {
    let entry = cache.get(key)?;
    match entry.validity(source_modified, settings_hash) {
        CacheValidity::Valid => Some(entry),
        reason => {
            debug!(key = key.as_str(), ?reason, "Invalidating cache entry");
            cache.invalidate(key);
            None
        }
    }
}

/// DashMapによるキャッシュ実装
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<Fingerprint, CacheEntry>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConversionCache for ResultCache {
    fn get(&self, key: &Fingerprint) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: Fingerprint, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn invalidate(&self, key: &Fingerprint) {
        self.entries.remove(key);
    }
}
