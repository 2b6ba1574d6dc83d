use crate::types::Language;

/// Verdict on a primary transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    English,
    NeedsFallback,
}

impl Classification {
    pub fn language(self) -> Language {
        match self {
            Classification::English => Language::English,
            Classification::NeedsFallback => Language::Khmer,
        }
    }
}

/// Empty text, or any code point above 127, sends the utterance to the fallback recognizer.
///
/// Known limitation: non-ASCII punctuation in English speech, or romanised Khmer, is
/// misclassified.
pub fn classify(text: &str) -> Classification {
    if text.is_empty() || text.chars().any(|c| c as u32 > 127) {
        Classification::NeedsFallback
    } else {
        Classification::English
    }
}
