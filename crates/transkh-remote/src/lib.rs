pub mod fallback_asr;
pub mod translation;

pub use fallback_asr::{extract_transcript, FallbackAsrClient, FallbackTranscriber};
pub use translation::{basic_auth_header, TranslationClient, Translator};
