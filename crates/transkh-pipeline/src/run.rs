//! Per-message run record and its state machine.

use transkh_core::{Language, Stage, SynthesisResult, TranscriptionResult, TranslationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Received,
    Preprocessed,
    Transcribed,
    FallbackTranscribed,
    LanguageDetermined,
    Translated,
    Synthesized,
    Replied,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Replied | RunState::Failed)
    }

    /// Legal successor states. `Failed` is reachable from every non-terminal state.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Received, Preprocessed)
                | (Received, Translated)
                | (Preprocessed, Transcribed)
                | (Transcribed, FallbackTranscribed)
                | (Transcribed, LanguageDetermined)
                | (FallbackTranscribed, LanguageDetermined)
                | (LanguageDetermined, Translated)
                | (Translated, Synthesized)
                | (Synthesized, Replied)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Voice,
    Text,
}

impl RunKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RunKind::Voice => "voice",
            RunKind::Text => "text",
        }
    }
}

/// What the synthesis stage produced, minus the waveform itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisSummary {
    pub language: Language,
    pub sample_rate: u32,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub stage: Stage,
    pub message: String,
}

/// Transient aggregate for one inbound message.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    run_id: String,
    kind: RunKind,
    history: Vec<RunState>,
    transcript: Option<TranscriptionResult>,
    language: Option<Language>,
    translation: Option<TranslationResult>,
    synthesis: Option<SynthesisSummary>,
    failure: Option<RunFailure>,
}

impl PipelineRun {
    pub fn new(kind: RunKind) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            history: vec![RunState::Received],
            transcript: None,
            language: None,
            translation: None,
            synthesis: None,
            failure: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn kind(&self) -> RunKind {
        self.kind
    }

    pub fn state(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Received)
    }

    /// Every state visited, in order, starting with `Received`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn transcript(&self) -> Option<&TranscriptionResult> {
        self.transcript.as_ref()
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn translation(&self) -> Option<&TranslationResult> {
        self.translation.as_ref()
    }

    pub fn synthesis(&self) -> Option<&SynthesisSummary> {
        self.synthesis.as_ref()
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    pub fn is_replied(&self) -> bool {
        self.state() == RunState::Replied
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        let current = self.state();
        debug_assert!(
            current.can_advance_to(next),
            "illegal transition {current:?} -> {next:?}"
        );
        tracing::debug!(run_id = %self.run_id, from = ?current, to = ?next, "state transition");
        self.history.push(next);
    }

    pub(crate) fn record_transcript(&mut self, transcript: TranscriptionResult) {
        self.transcript = Some(transcript);
    }

    pub(crate) fn record_language(&mut self, language: Language) {
        self.language = Some(language);
        self.advance(RunState::LanguageDetermined);
    }

    pub(crate) fn record_translation(&mut self, translation: TranslationResult) {
        self.translation = Some(translation);
        self.advance(RunState::Translated);
    }

    pub(crate) fn record_synthesis(&mut self, synthesis: &SynthesisResult) {
        self.synthesis = Some(SynthesisSummary {
            language: synthesis.language,
            sample_rate: synthesis.sample_rate,
            sample_count: synthesis.samples.len(),
        });
        self.advance(RunState::Synthesized);
    }

    pub(crate) fn fail(&mut self, stage: Stage, message: String) {
        self.failure = Some(RunFailure { stage, message });
        self.advance(RunState::Failed);
    }
}
