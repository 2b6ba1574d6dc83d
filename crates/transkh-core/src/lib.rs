pub mod config;
pub mod error;
pub mod language;
pub mod types;

pub use config::{AppConfig, EngineConfig};
pub use error::{
    AudioError, ConfigError, EngineError, FallbackAsrError, PipelineError, ReplyError, Stage,
    SynthesisError, TranscriptionError, TranslationError,
};
pub use language::{classify, Classification};
pub use types::{
    AudioSample, Command, InboundMessage, Language, MessageId, SynthesisRequest,
    SynthesisResult, TranscriptOrigin, TranscriptionResult, TranslationRequest,
    TranslationResult, TARGET_SAMPLE_RATE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_audio_sample_creation() {
        let sample = AudioSample::new(vec![0.0, 0.5, -0.5, 1.0], 16000);
        assert_eq!(sample.samples().len(), 4);
        assert_eq!(sample.sample_rate(), 16000);
        assert!(!sample.is_empty());
    }

    #[test]
    fn test_audio_sample_duration() {
        let sample = AudioSample::new(vec![0.0; 8000], 16000);
        assert_eq!(sample.duration(), Duration::from_millis(500));
        let empty = AudioSample::new(Vec::new(), 0);
        assert_eq!(empty.duration(), Duration::ZERO);
    }

    #[test]
    fn test_language_codes_and_names() {
        assert_eq!(Language::English.code(), "eng");
        assert_eq!(Language::Khmer.code(), "kh");
        assert_eq!(Language::English.to_string(), "English");
        assert_eq!(Language::Khmer.name(), "Khmer");
    }

    #[test]
    fn test_translation_request_targets_counterpart() {
        let req = TranslationRequest::new("hello", Language::English);
        assert_eq!(req.target, Language::Khmer);
        let req = TranslationRequest::new("សួស្តី", Language::Khmer);
        assert_eq!(req.target, Language::English);
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/help@transkh_bot"), Some(Command::Help));
        assert_eq!(Command::parse("/help me"), Some(Command::Help));
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_inbound_message_kind() {
        assert_eq!(InboundMessage::Voice(vec![1, 2]).kind(), "voice");
        assert_eq!(InboundMessage::Text("hi".into()).kind(), "text");
        assert_eq!(InboundMessage::Command(Command::Start).kind(), "command");
    }
}
