use crate::sink_trait::ReplySink;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use transkh_core::{MessageId, ReplyError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Text { id: MessageId, text: String },
    /// Voice replies keep the WAV bytes, since the source file is short-lived.
    Voice { id: MessageId, wav: Vec<u8> },
    Deleted(MessageId),
}

/// Records every call in order.
pub struct MemorySink {
    next_id: AtomicU64,
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            events: Mutex::new(Vec::new()),
        }
    }

    pub async fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().await.clone()
    }

    /// Texts still visible, i.e. sent and not deleted.
    pub async fn visible_texts(&self) -> Vec<String> {
        let events = self.events.lock().await;
        let deleted: Vec<MessageId> = events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Deleted(id) => Some(*id),
                _ => None,
            })
            .collect();
        events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Text { id, text } if !deleted.contains(id) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn voice_replies(&self) -> Vec<Vec<u8>> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Voice { wav, .. } => Some(wav.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), ReplyError> {
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<MessageId, ReplyError> {
        let id = self.next_id();
        self.events.lock().await.push(SinkEvent::Text {
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn send_voice(&self, wav_path: &Path) -> Result<MessageId, ReplyError> {
        let wav = tokio::fs::read(wav_path)
            .await
            .map_err(|e| ReplyError::SendFailed(format!("{}: {e}", wav_path.display())))?;
        let id = self.next_id();
        self.events.lock().await.push(SinkEvent::Voice { id, wav });
        Ok(id)
    }

    async fn delete_message(&self, id: MessageId) -> Result<(), ReplyError> {
        let mut events = self.events.lock().await;
        let known = events.iter().any(|e| match e {
            SinkEvent::Text { id: sent, .. } | SinkEvent::Voice { id: sent, .. } => *sent == id,
            SinkEvent::Deleted(_) => false,
        });
        if !known {
            return Err(ReplyError::DeleteFailed(format!("unknown message {id}")));
        }
        events.push(SinkEvent::Deleted(id));
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ReplyError> {
        Ok(())
    }
}
