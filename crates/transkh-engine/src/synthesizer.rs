use crate::host::SynthesizerHost;
use transkh_core::{Language, SynthesisError, SynthesisRequest, SynthesisResult};

/// Text-to-speech for both languages, one engine per language.
pub struct SpeechSynthesizer {
    english: SynthesizerHost,
    khmer: SynthesizerHost,
}

impl SpeechSynthesizer {
    pub fn new(english: SynthesizerHost, khmer: SynthesizerHost) -> Self {
        Self { english, khmer }
    }

    fn host_for(&self, language: Language) -> &SynthesizerHost {
        match language {
            Language::English => &self.english,
            Language::Khmer => &self.khmer,
        }
    }

    pub fn sample_rate(&self, language: Language) -> u32 {
        self.host_for(language).sample_rate()
    }

    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let host = self.host_for(request.language);
        let samples = host.synthesize(&request.text).await?;
        tracing::debug!(
            engine = %host.engine_name(),
            language = %request.language,
            samples = samples.len(),
            sample_rate = host.sample_rate(),
            "synthesis done"
        );
        Ok(SynthesisResult {
            samples,
            sample_rate: host.sample_rate(),
            language: request.language,
        })
    }

    pub async fn shutdown(self) {
        self.english.shutdown().await;
        self.khmer.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullSynthesizer;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_synthesizer_selects_engine_by_language() {
        let english = NullSynthesizer::with_sample_rate(16000);
        let khmer = NullSynthesizer::with_sample_rate(22050);
        let english_calls = english.call_counter();
        let khmer_calls = khmer.call_counter();
        let synth = SpeechSynthesizer::new(
            SynthesizerHost::spawn(Box::new(english), Duration::from_secs(2)),
            SynthesizerHost::spawn(Box::new(khmer), Duration::from_secs(2)),
        );

        let result = synth
            .synthesize(&SynthesisRequest {
                text: "សួស្តី".to_string(),
                language: Language::Khmer,
            })
            .await
            .unwrap();
        assert_eq!(result.sample_rate, 22050);
        assert_eq!(result.language, Language::Khmer);
        assert_eq!(khmer_calls.load(Ordering::Relaxed), 1);
        assert_eq!(english_calls.load(Ordering::Relaxed), 0);

        let result = synth
            .synthesize(&SynthesisRequest {
                text: "Hello".to_string(),
                language: Language::English,
            })
            .await
            .unwrap();
        assert_eq!(result.sample_rate, 16000);
        assert_eq!(english_calls.load(Ordering::Relaxed), 1);
        synth.shutdown().await;
    }

    #[tokio::test]
    async fn test_synthesizer_reports_declared_rates() {
        let synth = SpeechSynthesizer::new(
            SynthesizerHost::spawn(Box::new(NullSynthesizer::with_sample_rate(24000)), Duration::from_secs(2)),
            SynthesizerHost::spawn(Box::new(NullSynthesizer::with_sample_rate(16000)), Duration::from_secs(2)),
        );
        assert_eq!(synth.sample_rate(Language::English), 24000);
        assert_eq!(synth.sample_rate(Language::Khmer), 16000);
    }
}
