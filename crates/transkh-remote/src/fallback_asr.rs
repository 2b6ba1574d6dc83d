//! Second-opinion transcription over a WebSocket.
//!
//! One exchange per call: connect, send the whole utterance as a single
//! binary frame of 16-bit little-endian PCM, read one data frame, close.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use transkh_core::config::FallbackAsrConfig;
use transkh_core::{AudioSample, FallbackAsrError, TranscriptOrigin, TranscriptionResult};

#[async_trait]
pub trait FallbackTranscriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioSample)
        -> Result<TranscriptionResult, FallbackAsrError>;
}

pub struct FallbackAsrClient {
    url: String,
    timeout: Duration,
}

impl FallbackAsrClient {
    pub fn new(config: &FallbackAsrConfig) -> Self {
        Self::with_timeout(&config.url, config.timeout())
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Self {
        // wss:// needs a process-wide crypto provider; a second install is a no-op
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self {
            url: url.to_string(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn exchange(&self, pcm: Vec<u8>) -> Result<String, FallbackAsrError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| FallbackAsrError::Connect(e.to_string()))?;
        let (mut writer, mut reader) = ws_stream.split();

        writer
            .send(Message::Binary(pcm.into()))
            .await
            .map_err(|e| FallbackAsrError::Exchange(e.to_string()))?;

        let payload = loop {
            let Some(msg) = reader.next().await else {
                return Err(FallbackAsrError::Exchange(
                    "connection ended before a response arrived".to_string(),
                ));
            };
            match msg.map_err(|e| FallbackAsrError::Exchange(e.to_string()))? {
                Message::Text(text) => break text.to_string(),
                Message::Binary(bytes) => {
                    break String::from_utf8(bytes.to_vec()).map_err(|_| {
                        FallbackAsrError::MalformedResponse(
                            "binary response is not valid UTF-8".to_string(),
                        )
                    })?;
                }
                Message::Close(frame) => {
                    return Err(FallbackAsrError::Exchange(format!(
                        "service closed the connection before responding: {frame:?}"
                    )));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        };

        if let Err(e) = writer.send(Message::Close(None)).await {
            tracing::debug!("fallback ASR close failed: {e}");
        }
        Ok(payload)
    }
}

#[async_trait]
impl FallbackTranscriber for FallbackAsrClient {
    async fn transcribe(
        &self,
        audio: &AudioSample,
    ) -> Result<TranscriptionResult, FallbackAsrError> {
        let pcm = transkh_audio::encode_i16_le(audio.samples());
        tracing::debug!(url = %self.url, bytes = pcm.len(), "sending audio to fallback ASR");

        let payload = tokio::time::timeout(self.timeout, self.exchange(pcm))
            .await
            .map_err(|_| FallbackAsrError::Timeout(self.timeout))??;

        let text = extract_transcript(&payload)?;
        tracing::info!(chars = text.chars().count(), "fallback transcription received");
        Ok(TranscriptionResult {
            text,
            origin: TranscriptOrigin::Fallback,
        })
    }
}

/// Picks `partial`, then `text`, out of a JSON object; any other JSON value
/// yields the raw payload.
pub fn extract_transcript(payload: &str) -> Result<String, FallbackAsrError> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| FallbackAsrError::MalformedResponse(format!("not JSON: {e}")))?;

    let field = value.get("partial").or_else(|| value.get("text"));
    Ok(match field {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => payload.to_string(),
    })
}
