use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Reading, decoding, or writing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("failed to resample audio: {0}")]
    Resample(String),

    #[error("failed to encode audio: {0}")]
    Encode(String),

    #[error("scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    #[error("engine not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("transcription engine failed: {0}")]
    Engine(String),

    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),

    #[error("transcription worker is not running")]
    WorkerGone,
}

#[derive(Debug, Error)]
pub enum FallbackAsrError {
    #[error("failed to connect to fallback ASR service: {0}")]
    Connect(String),

    #[error("fallback ASR exchange failed: {0}")]
    Exchange(String),

    #[error("fallback ASR timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed fallback ASR response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum TranslationError {
    /// The service answered but `translate_text` was missing or empty.
    #[error("translation result is empty or invalid")]
    Empty,

    #[error("translation request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis engine failed: {0}")]
    Engine(String),

    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("synthesis worker is not running")]
    WorkerGone,
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply sink initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to send reply: {0}")]
    SendFailed(String),

    #[error("failed to delete message: {0}")]
    DeleteFailed(String),

    #[error("reply sink not found: {0}")]
    NotFound(String),
}

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Transcribe,
    FallbackTranscribe,
    Translate,
    Synthesize,
    Reply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocess => "preprocess",
            Stage::Transcribe => "transcribe",
            Stage::FallbackTranscribe => "fallback_transcribe",
            Stage::Translate => "translate",
            Stage::Synthesize => "synthesize",
            Stage::Reply => "reply",
        };
        f.write_str(name)
    }
}

/// A failed pipeline run, tagged by the stage that produced it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    FallbackAsr(#[from] FallbackAsrError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Reply(#[from] ReplyError),

    /// Writing the synthesized reply to scratch storage.
    #[error("failed to prepare voice reply: {0}")]
    ReplyAudio(AudioError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Audio(_) => Stage::Preprocess,
            PipelineError::Transcription(_) => Stage::Transcribe,
            PipelineError::FallbackAsr(_) => Stage::FallbackTranscribe,
            PipelineError::Translation(_) => Stage::Translate,
            PipelineError::Synthesis(_) => Stage::Synthesize,
            PipelineError::Reply(_) | PipelineError::ReplyAudio(_) => Stage::Reply,
        }
    }
}
