use crate::sink_trait::ReplySink;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use transkh_core::{MessageId, ReplyError};

/// Emits replies as tracing events. The default sink for command-line runs.
pub struct LogSink {
    next_id: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), ReplyError> {
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<MessageId, ReplyError> {
        let id = self.next_id();
        tracing::info!(message_id = %id, "reply: {text}");
        Ok(id)
    }

    async fn send_voice(&self, wav_path: &Path) -> Result<MessageId, ReplyError> {
        let meta = tokio::fs::metadata(wav_path)
            .await
            .map_err(|e| ReplyError::SendFailed(format!("{}: {e}", wav_path.display())))?;
        let id = self.next_id();
        tracing::info!(
            message_id = %id,
            path = %wav_path.display(),
            bytes = meta.len(),
            "voice reply"
        );
        Ok(id)
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ReplyError> {
        tracing::info!(message_id = %id, "message deleted");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ReplyError> {
        Ok(())
    }
}
