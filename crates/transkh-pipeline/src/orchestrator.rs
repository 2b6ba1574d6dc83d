use crate::messages::{self, clean_english};
use crate::run::{PipelineRun, RunKind, RunState};
use std::path::PathBuf;
use tracing::Instrument;
use transkh_audio::ScratchSpace;
use transkh_core::{
    classify, Classification, Command, InboundMessage, Language, MessageId, PipelineError,
    SynthesisRequest, SynthesisResult, TranslationError, TranslationRequest, TranslationResult,
};
use transkh_engine::{PrimaryTranscriber, SpeechSynthesizer};
use transkh_remote::{FallbackTranscriber, Translator};
use transkh_reply::ReplySink;

/// Result of handling one inbound message.
#[derive(Debug)]
pub enum MessageOutcome {
    /// A command was answered; no run was created.
    Command(Command),
    Run(PipelineRun),
}

/// Sequences the pipeline stages and owns every failure decision.
pub struct PipelineOrchestrator {
    transcriber: PrimaryTranscriber,
    fallback: Box<dyn FallbackTranscriber>,
    translator: Box<dyn Translator>,
    synthesizer: SpeechSynthesizer,
    scratch_base: PathBuf,
}

impl PipelineOrchestrator {
    pub fn new(
        transcriber: PrimaryTranscriber,
        fallback: Box<dyn FallbackTranscriber>,
        translator: Box<dyn Translator>,
        synthesizer: SpeechSynthesizer,
        scratch_base: PathBuf,
    ) -> Self {
        Self {
            transcriber,
            fallback,
            translator,
            synthesizer,
            scratch_base,
        }
    }

    pub async fn handle(&self, message: InboundMessage, sink: &dyn ReplySink) -> MessageOutcome {
        match message {
            InboundMessage::Voice(bytes) => MessageOutcome::Run(self.process_voice(&bytes, sink).await),
            InboundMessage::Text(text) => MessageOutcome::Run(self.process_text(&text, sink).await),
            InboundMessage::Command(command) => {
                self.reply_to_command(command, sink).await;
                MessageOutcome::Command(command)
            }
        }
    }

    pub async fn reply_to_command(&self, command: Command, sink: &dyn ReplySink) {
        if let Err(e) = sink.send_text(messages::command_reply(command)).await {
            tracing::error!(?command, "failed to answer command: {e}");
        }
    }

    /// Runs the voice path. The returned run is always terminal.
    pub async fn process_voice(&self, audio: &[u8], sink: &dyn ReplySink) -> PipelineRun {
        let mut run = PipelineRun::new(RunKind::Voice);
        let span = tracing::info_span!("run", run_id = %run.run_id(), kind = "voice");
        async {
            tracing::info!(bytes = audio.len(), "voice message received");
            let mut placeholder = send_placeholder(sink, messages::VOICE_PLACEHOLDER).await;

            match self.voice_stages(&mut run, audio, sink, &mut placeholder).await {
                Ok(()) => {
                    run.advance(RunState::Replied);
                    tracing::info!("voice message answered");
                }
                Err(e) => {
                    fail_run(&mut run, e, sink, &mut placeholder, messages::VOICE_FAILURE).await
                }
            }
        }
        .instrument(span)
        .await;
        run
    }

    /// Runs the text path: the text is taken as Khmer and answered in English.
    pub async fn process_text(&self, text: &str, sink: &dyn ReplySink) -> PipelineRun {
        let mut run = PipelineRun::new(RunKind::Text);
        let span = tracing::info_span!("run", run_id = %run.run_id(), kind = "text");
        async {
            tracing::info!(chars = text.chars().count(), "text message received");
            let mut placeholder = send_placeholder(sink, messages::TEXT_PLACEHOLDER).await;

            match self.text_stages(&mut run, text, sink, &mut placeholder).await {
                Ok(()) => {
                    run.advance(RunState::Replied);
                    tracing::info!("text message answered");
                }
                Err(e) => fail_run(&mut run, e, sink, &mut placeholder, messages::TEXT_FAILURE).await,
            }
        }
        .instrument(span)
        .await;
        run
    }

    async fn voice_stages(
        &self,
        run: &mut PipelineRun,
        audio: &[u8],
        sink: &dyn ReplySink,
        placeholder: &mut Option<MessageId>,
    ) -> Result<(), PipelineError> {
        let prepared = transkh_audio::preprocess(audio)?;
        tracing::debug!(
            resampled_ms = prepared.resampled.duration().as_millis() as u64,
            trimmed_ms = prepared.trimmed.duration().as_millis() as u64,
            "audio preprocessed"
        );
        run.advance(RunState::Preprocessed);

        let primary = self.transcriber.transcribe(prepared.trimmed).await?;
        run.advance(RunState::Transcribed);

        let classification = classify(&primary.text);
        let transcript = match classification {
            Classification::English => primary,
            Classification::NeedsFallback => {
                tracing::info!(
                    primary_chars = primary.text.chars().count(),
                    "primary transcript not English, using fallback recognizer"
                );
                let fallback = self.fallback.transcribe(&prepared.resampled).await?;
                run.advance(RunState::FallbackTranscribed);
                fallback
            }
        };
        let language = classification.language();
        tracing::info!(%language, origin = ?transcript.origin, "transcript: {}", transcript.text);
        run.record_transcript(transcript.clone());
        run.record_language(language);

        // Khmer-to-English output can come back as a stringified list.
        let tidy: fn(&str) -> String = match language {
            Language::Khmer => clean_english,
            Language::English => str::to_string,
        };
        let translation = self
            .translate(TranslationRequest::new(transcript.text.as_str(), language), tidy)
            .await?;
        run.record_translation(translation.clone());

        let synthesis = self.synthesize(&translation).await?;
        run.record_synthesis(&synthesis);

        let reply = messages::voice_success(language, &transcript.text, &translation.translated_text);
        self.deliver(run, sink, placeholder, &reply, &synthesis).await
    }

    async fn text_stages(
        &self,
        run: &mut PipelineRun,
        text: &str,
        sink: &dyn ReplySink,
        placeholder: &mut Option<MessageId>,
    ) -> Result<(), PipelineError> {
        let translation = self
            .translate(TranslationRequest::new(text, Language::Khmer), |t| {
                t.trim().to_string()
            })
            .await?;
        run.record_translation(translation.clone());

        let synthesis = self.synthesize(&translation).await?;
        run.record_synthesis(&synthesis);

        let reply = messages::text_success(text, &translation.translated_text);
        self.deliver(run, sink, placeholder, &reply, &synthesis).await
    }

    /// Translates and applies `tidy` to the result; an empty result fails the stage.
    async fn translate(
        &self,
        request: TranslationRequest,
        tidy: fn(&str) -> String,
    ) -> Result<TranslationResult, TranslationError> {
        let mut translation = self.translator.translate(&request).await?;
        translation.translated_text = tidy(&translation.translated_text);
        if translation.translated_text.is_empty() {
            return Err(TranslationError::Empty);
        }
        tracing::info!(
            src = translation.source.code(),
            tgt = translation.target.code(),
            "translation: {}",
            translation.translated_text
        );
        Ok(translation)
    }

    /// Voices the translation with the engine for its target language.
    async fn synthesize(
        &self,
        translation: &TranslationResult,
    ) -> Result<SynthesisResult, PipelineError> {
        let request = SynthesisRequest {
            text: translation.translated_text.clone(),
            language: translation.target,
        };
        Ok(self.synthesizer.synthesize(&request).await?)
    }

    /// Retracts the placeholder, then sends the text reply and the voice reply, in that order.
    /// A text reply whose voice reply fails is retracted again.
    async fn deliver(
        &self,
        run: &PipelineRun,
        sink: &dyn ReplySink,
        placeholder: &mut Option<MessageId>,
        text: &str,
        synthesis: &SynthesisResult,
    ) -> Result<(), PipelineError> {
        let scratch = ScratchSpace::create_in(&self.scratch_base, run.run_id())
            .map_err(PipelineError::ReplyAudio)?;
        let wav_name = format!("{}_speech.wav", synthesis.language.name().to_lowercase());
        let wav_path = scratch
            .write_wav(&wav_name, synthesis)
            .map_err(PipelineError::ReplyAudio)?;

        retract_placeholder(sink, placeholder).await;
        let text_id = sink.send_text(text).await?;
        if let Err(e) = sink.send_voice(&wav_path).await {
            if let Err(del) = sink.delete_message(text_id).await {
                tracing::warn!(message_id = %text_id, "failed to retract text reply: {del}");
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn shutdown(self) {
        self.transcriber.shutdown().await;
        self.synthesizer.shutdown().await;
    }
}

/// A missing placeholder does not stop the run.
async fn send_placeholder(sink: &dyn ReplySink, text: &str) -> Option<MessageId> {
    match sink.send_text(text).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("failed to send placeholder: {e}");
            None
        }
    }
}

async fn retract_placeholder(sink: &dyn ReplySink, placeholder: &mut Option<MessageId>) {
    if let Some(id) = placeholder.take() {
        if let Err(e) = sink.delete_message(id).await {
            tracing::warn!(message_id = %id, "failed to delete placeholder: {e}");
        }
    }
}

async fn fail_run(
    run: &mut PipelineRun,
    error: PipelineError,
    sink: &dyn ReplySink,
    placeholder: &mut Option<MessageId>,
    failure_text: &str,
) {
    let stage = error.stage();
    tracing::error!(
        run_id = %run.run_id(),
        %stage,
        state = ?run.state(),
        "run failed: {error}"
    );
    run.fail(stage, error.to_string());

    retract_placeholder(sink, placeholder).await;
    if let Err(e) = sink.send_text(failure_text).await {
        tracing::error!(run_id = %run.run_id(), "failed to send failure reply: {e}");
    }
}
