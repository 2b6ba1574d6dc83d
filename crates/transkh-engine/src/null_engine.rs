//! Deterministic stand-in engines for dry runs and tests.

use crate::engine_trait::{SpeechSynthesis, SpeechToText};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use transkh_core::{AudioSample, EngineError, SynthesisError, TranscriptionError};

const DEFAULT_SAMPLE_RATE: u32 = 16000;
/// Samples of tone produced per input character.
const SAMPLES_PER_CHAR: usize = 160;

/// Returns the configured `text` for every utterance.
pub struct NullTranscriber {
    text: String,
    call_count: Arc<AtomicUsize>,
}

impl NullTranscriber {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new()
        }
    }

    /// Shared counter, readable after the engine has moved into a host.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

impl Default for NullTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for NullTranscriber {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        if let Some(text) = config.get("text") {
            let text = text.as_str().ok_or_else(|| {
                EngineError::InitializationFailed("'text' must be a string".to_string())
            })?;
            self.text = text.to_string();
        }
        Ok(())
    }

    async fn transcribe(&mut self, audio: AudioSample) -> Result<String, TranscriptionError> {
        let count = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(
            "NullTranscriber call #{count}, {} samples",
            audio.samples().len()
        );
        Ok(self.text.clone())
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Emits a short tone per character at the configured `sample_rate`.
pub struct NullSynthesizer {
    sample_rate: u32,
    call_count: Arc<AtomicUsize>,
}

impl NullSynthesizer {
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::new()
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

impl Default for NullSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesis for NullSynthesizer {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        if let Some(rate) = config.get("sample_rate") {
            let rate = rate
                .as_integer()
                .filter(|r| *r > 0 && *r <= u32::MAX as i64)
                .ok_or_else(|| {
                    EngineError::InitializationFailed(
                        "'sample_rate' must be a positive integer".to_string(),
                    )
                })?;
            self.sample_rate = rate as u32;
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, SynthesisError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let len = text.chars().count() * SAMPLES_PER_CHAR;
        let step = 2.0 * std::f32::consts::PI * 220.0 / self.sample_rate as f32;
        Ok((0..len).map(|i| 0.1 * (i as f32 * step).sin()).collect())
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
