// チェックポイント永続化の具象実装

use crate::core::{CheckpointStore, SessionState};
use crate::services::atomic::write_atomic;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub const STATE_FILE_NAME: &str = "conversion_state.json";

/// `<home>/.image_convert/state/conversion_state.json`
pub fn default_state_path() -> Result<PathBuf> {
    Ok(crate::services::config::app_dir()?
        .join("state")
        .join(STATE_FILE_NAME))
}

/// メモリ内保存の実装（テスト用）
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    state: Arc<Mutex<Option<SessionState>>>,
    save_count: Arc<Mutex<usize>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存セッションを持った状態で作成
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
            save_count: Arc::new(Mutex::new(0)),
        }
    }

    /// テスト用：現在保存されている状態
    pub async fn snapshot(&self) -> Option<SessionState> {
        self.state.lock().await.clone()
    }

    /// テスト用：saveが呼ばれた回数
    pub async fn save_count(&self) -> usize {
        *self.save_count.lock().await
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, state: &SessionState) -> Result<()> {
        *self.state.lock().await = Some(state.clone());
        *self.save_count.lock().await += 1;
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionState>> {
        Ok(self.state.lock().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.state.lock().await = None;
        Ok(())
    }
}

/// JSONファイルへの永続化実装
///
/// 保存は毎回スナップショット全体の上書き（一時ファイル→rename）。
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ユーザーごとの既定の保存先を使用
    pub fn with_default_path() -> Result<Self> {
        Ok(Self::new(default_state_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for JsonCheckpointStore {
    async fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(state).context("Failed to serialize session state")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .context("State writer task failed")?
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        debug!(
            session_id = %state.session_id,
            processed = state.processed_count(),
            "Saved checkpoint"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionState>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read state file: {}", self.path.display()))
            }
        };

        let state = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;
        Ok(Some(state))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove state file: {}", self.path.display())),
        }
    }
}
