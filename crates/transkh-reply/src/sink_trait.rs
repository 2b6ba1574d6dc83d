use async_trait::async_trait;
use std::path::Path;
use transkh_core::{MessageId, ReplyError};

/// Where pipeline replies are delivered.
///
/// Implementations are registered via [`SinkRegistry`](crate::SinkRegistry).
/// Every message sent returns a [`MessageId`] that can later be passed to
/// [`delete_message`](Self::delete_message), which is how the pipeline
/// retracts its "processing" placeholder.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Returns the sink's registry name (e.g. `"file"`, `"log"`).
    fn name(&self) -> &str;
    /// One-time initialisation with sink-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), ReplyError>;
    async fn send_text(&self, text: &str) -> Result<MessageId, ReplyError>;
    /// Deliver a voice reply. `wav_path` may be removed once this returns.
    async fn send_voice(&self, wav_path: &Path) -> Result<MessageId, ReplyError>;
    async fn delete_message(&self, id: MessageId) -> Result<(), ReplyError>;
    async fn shutdown(&self) -> Result<(), ReplyError>;
}
