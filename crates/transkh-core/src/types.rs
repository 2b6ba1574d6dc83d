use std::fmt;
use std::time::Duration;

/// Sample rate every recognizer in the pipeline expects.
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Mono waveform, normalised to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSample {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// The two languages the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Khmer,
}

impl Language {
    /// Code understood by the translation service.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "eng",
            Language::Khmer => "kh",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Khmer => "Khmer",
        }
    }

    /// The language a message in `self` gets translated into.
    pub fn counterpart(self) -> Language {
        match self {
            Language::English => Language::Khmer,
            Language::Khmer => Language::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptOrigin {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub text: String,
    pub origin: TranscriptOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: Language) -> Self {
        Self {
            text: text.into(),
            source,
            target: source.counterpart(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub source_text: String,
    pub source: Language,
    pub target: Language,
    pub translated_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub language: Language,
}

/// Opaque handle to a message the front-end has delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parses `/start` and `/help`, ignoring a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.split_whitespace().next()?;
        let word = word.split('@').next().unwrap_or(word);
        match word {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// One message handed to the pipeline by the front-end.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Encoded audio container bytes.
    Voice(Vec<u8>),
    Text(String),
    Command(Command),
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Voice(_) => "voice",
            InboundMessage::Text(_) => "text",
            InboundMessage::Command(_) => "command",
        }
    }
}
