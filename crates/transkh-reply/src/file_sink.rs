use crate::sink_trait::ReplySink;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use transkh_core::{MessageId, ReplyError};

/// Writes each reply as a numbered file (`0001.txt`, `0002.wav`, ...) in `dir`.
/// Deleting a message removes its file.
pub struct FileSink {
    dir: Option<PathBuf>,
    next_id: AtomicU64,
    files: Mutex<HashMap<MessageId, PathBuf>>,
}

impl FileSink {
    pub fn new() -> Self {
        Self {
            dir: None,
            next_id: AtomicU64::new(1),
            files: Mutex::new(HashMap::new()),
        }
    }

    fn next_path(&self, extension: &str) -> Result<(MessageId, PathBuf), ReplyError> {
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| ReplyError::SendFailed("not initialized".to_string()))?;
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Ok((id, dir.join(format!("{:04}.{extension}", id.0))))
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), ReplyError> {
        let dir = config
            .get("dir")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ReplyError::InitializationFailed("missing 'dir' in config".to_string())
            })?;
        let dir = PathBuf::from(dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ReplyError::InitializationFailed(format!("{}: {e}", dir.display())))?;
        tracing::info!(dir = %dir.display(), "FileSink initialized");
        self.dir = Some(dir);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<MessageId, ReplyError> {
        let (id, path) = self.next_path("txt")?;
        tokio::fs::write(&path, format!("{text}\n"))
            .await
            .map_err(|e| ReplyError::SendFailed(e.to_string()))?;
        self.files.lock().await.insert(id, path);
        Ok(id)
    }

    async fn send_voice(&self, wav_path: &Path) -> Result<MessageId, ReplyError> {
        let (id, path) = self.next_path("wav")?;
        tokio::fs::copy(wav_path, &path)
            .await
            .map_err(|e| ReplyError::SendFailed(format!("{}: {e}", wav_path.display())))?;
        self.files.lock().await.insert(id, path);
        Ok(id)
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ReplyError> {
        let path = self
            .files
            .lock()
            .await
            .remove(&id)
            .ok_or_else(|| ReplyError::DeleteFailed(format!("unknown message {id}")))?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ReplyError::DeleteFailed(e.to_string()))
    }

    async fn shutdown(&self) -> Result<(), ReplyError> {
        Ok(())
    }
}
