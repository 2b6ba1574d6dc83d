//! Engines backed by an inference sidecar reachable over HTTP.
//!
//! The sidecar exposes `POST /transcribe` (WAV body, `{"text": ..}` reply) and
//! `POST /synthesize` (`{"text", "language"}` body, WAV reply).

use crate::engine_trait::{SpeechSynthesis, SpeechToText};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use transkh_core::{AudioSample, EngineError, SynthesisError, TranscriptionError};

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

fn required_str(config: &toml::Value, key: &str, engine: &str) -> Result<String, EngineError> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim_end_matches('/').to_string())
        .ok_or_else(|| {
            EngineError::InitializationFailed(format!("missing '{key}' in {engine} config"))
        })
}

fn build_client(config: &toml::Value) -> Result<reqwest::Client, EngineError> {
    let timeout_ms = config
        .get("timeout_ms")
        .and_then(|v| v.as_integer())
        .map(|v| v.max(1) as u64)
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| EngineError::InitializationFailed(format!("failed to create HTTP client: {e}")))
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
}

pub struct HttpTranscriber {
    url: Option<String>,
    client: Option<reqwest::Client>,
}

impl HttpTranscriber {
    pub fn new() -> Self {
        Self {
            url: None,
            client: None,
        }
    }
}

impl Default for HttpTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for HttpTranscriber {
    fn name(&self) -> &str {
        "http"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        let url = required_str(&config, "url", "http transcriber")?;
        self.client = Some(build_client(&config)?);
        tracing::info!(url = %url, "HttpTranscriber initialized");
        self.url = Some(url);
        Ok(())
    }

    async fn transcribe(&mut self, audio: AudioSample) -> Result<String, TranscriptionError> {
        let (Some(url), Some(client)) = (self.url.as_ref(), self.client.as_ref()) else {
            return Err(TranscriptionError::Engine("not initialized".to_string()));
        };
        let wav = transkh_audio::wav::encode_pcm16(audio.samples(), audio.sample_rate())
            .map_err(|e| TranscriptionError::Engine(e.to_string()))?;

        let response = client
            .post(format!("{url}/transcribe"))
            .query(&[("language", "auto")])
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TranscriptionError::Engine(e.to_string()))?;

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Engine(format!("bad transcription response: {e}")))?;
        Ok(body.text)
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

pub struct HttpSynthesizer {
    url: Option<String>,
    language: Option<String>,
    sample_rate: u32,
    client: Option<reqwest::Client>,
}

impl HttpSynthesizer {
    pub fn new() -> Self {
        Self {
            url: None,
            language: None,
            sample_rate: 0,
            client: None,
        }
    }
}

impl Default for HttpSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesis for HttpSynthesizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        let url = required_str(&config, "url", "http synthesizer")?;
        let sample_rate = config
            .get("sample_rate")
            .and_then(|v| v.as_integer())
            .filter(|r| *r > 0 && *r <= u32::MAX as i64)
            .ok_or_else(|| {
                EngineError::InitializationFailed(
                    "missing or invalid 'sample_rate' in http synthesizer config".to_string(),
                )
            })?;
        self.language = config
            .get("language")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        self.sample_rate = sample_rate as u32;
        self.client = Some(build_client(&config)?);

        tracing::info!(
            url = %url,
            sample_rate = self.sample_rate,
            language = ?self.language,
            "HttpSynthesizer initialized"
        );
        self.url = Some(url);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&mut self, text: &str) -> Result<Vec<f32>, SynthesisError> {
        let (Some(url), Some(client)) = (self.url.as_ref(), self.client.as_ref()) else {
            return Err(SynthesisError::Engine("not initialized".to_string()));
        };
        let request = SynthesizeRequest {
            text,
            language: self.language.as_deref(),
        };

        let bytes = client
            .post(format!("{url}/synthesize"))
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SynthesisError::Engine(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| SynthesisError::Engine(e.to_string()))?;

        let audio = transkh_audio::wav::decode(&bytes)
            .map_err(|e| SynthesisError::Engine(e.to_string()))?;
        if audio.sample_rate() != self.sample_rate {
            return Err(SynthesisError::Engine(format!(
                "engine returned {} Hz audio, declared {} Hz",
                audio.sample_rate(),
                self.sample_rate
            )));
        }
        Ok(audio.into_samples())
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
