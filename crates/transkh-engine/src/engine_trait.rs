use async_trait::async_trait;
use transkh_core::{AudioSample, EngineError, SynthesisError, TranscriptionError};

/// A speech-to-text capability. Runs in auto-detect mode: no language hint is given.
#[async_trait]
pub trait SpeechToText: Send {
    fn name(&self) -> &str;
    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError>;
    async fn transcribe(&mut self, audio: AudioSample) -> Result<String, TranscriptionError>;
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// A speech-synthesis capability bound to one language.
#[async_trait]
pub trait SpeechSynthesis: Send {
    fn name(&self) -> &str;
    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError>;
    /// Rate of every waveform this engine produces. Valid after `initialize`.
    fn sample_rate(&self) -> u32;
    async fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, SynthesisError>;
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}
