// 変換セッションの状態（中断再開用）

use super::types::OutputFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 1回の変換実行のスナップショット
///
/// 結果を1件取り込むごとに追記され、その都度永続化される。
/// 正常終了時に削除される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub input_dir: PathBuf,
    pub target_format: OutputFormat,
    /// 開始時に宣言された総ファイル数
    pub total_files: usize,
    /// 処理済み（成功・スキップ・失敗を問わない）ソースパス
    pub processed_files: Vec<PathBuf>,
}

impl SessionState {
    pub fn new(input_dir: impl Into<PathBuf>, target_format: OutputFormat, total_files: usize) -> Self {
        Self {
            session_id: generate_session_id(),
            start_time: Utc::now(),
            input_dir: input_dir.into(),
            target_format,
            total_files,
            processed_files: Vec::new(),
        }
    }

    /// 完了したソースパスを追記
    pub fn record(&mut self, path: impl Into<PathBuf>) {
        self.processed_files.push(path.into());
    }

    pub fn is_processed(&self, path: &Path) -> bool {
        self.processed_files.iter().any(|p| p == path)
    }

    /// 再ディスパッチ判定用の集合
    pub fn processed_set(&self) -> HashSet<&Path> {
        self.processed_files.iter().map(PathBuf::as_path).collect()
    }

    pub fn processed_count(&self) -> usize {
        self.processed_files.len()
    }
}

/// 8バイトのランダムなセッションID（16進文字列）
pub fn generate_session_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_state() {
        let state = SessionState::new("/photos", OutputFormat::Webp, 12);

        assert_eq!(state.input_dir, PathBuf::from("/photos"));
        assert_eq!(state.target_format, OutputFormat::Webp);
        assert_eq!(state.total_files, 12);
        assert_eq!(state.session_id.len(), 16);
        assert!(state.processed_files.is_empty());
    }

    #[test]
    fn test_session_ids_are_random() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_record_and_lookup() {
        let mut state = SessionState::new("/photos", OutputFormat::Png, 2);
        state.record("/photos/a.jpg");

        assert!(state.is_processed(Path::new("/photos/a.jpg")));
        assert!(!state.is_processed(Path::new("/photos/b.jpg")));
        assert_eq!(state.processed_count(), 1);
        assert!(state.processed_set().contains(Path::new("/photos/a.jpg")));
    }

    #[test]
    fn test_serialized_field_names() {
        let state = SessionState::new("/photos", OutputFormat::Jpeg, 1);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["target_format"], "jpeg");
        assert!(json.get("session_id").is_some());
        assert!(json.get("start_time").is_some());
        assert!(json.get("processed_files").unwrap().is_array());
    }
}
