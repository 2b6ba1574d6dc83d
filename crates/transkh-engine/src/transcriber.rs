use crate::host::TranscriberHost;
use transkh_core::{AudioSample, TranscriptOrigin, TranscriptionResult, TranscriptionError};

/// First-pass speech-to-text. Runs the engine in auto mode, so the text may
/// be in either language or empty.
pub struct PrimaryTranscriber {
    host: TranscriberHost,
}

impl PrimaryTranscriber {
    pub fn new(host: TranscriberHost) -> Self {
        Self { host }
    }

    pub async fn transcribe(
        &self,
        audio: AudioSample,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let duration = audio.duration();
        let text = self.host.transcribe(audio).await?;
        tracing::debug!(
            engine = %self.host.engine_name(),
            duration_ms = duration.as_millis() as u64,
            chars = text.chars().count(),
            "primary transcription done"
        );
        Ok(TranscriptionResult {
            text,
            origin: TranscriptOrigin::Primary,
        })
    }

    pub async fn shutdown(self) {
        self.host.shutdown().await;
    }
}
