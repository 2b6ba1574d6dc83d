use crate::engine_trait::{SpeechSynthesis, SpeechToText};
use std::collections::HashMap;
use transkh_core::{EngineConfig, EngineError};

pub struct EngineRegistry {
    transcribers: HashMap<String, fn() -> Box<dyn SpeechToText>>,
    synthesizers: HashMap<String, fn() -> Box<dyn SpeechSynthesis>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            transcribers: HashMap::new(),
            synthesizers: HashMap::new(),
        };
        registry.register_transcriber("null", || {
            Box::new(crate::null_engine::NullTranscriber::new())
        });
        registry.register_transcriber("http", || {
            Box::new(crate::http_engine::HttpTranscriber::new())
        });
        registry.register_synthesizer("null", || {
            Box::new(crate::null_engine::NullSynthesizer::new())
        });
        registry.register_synthesizer("http", || {
            Box::new(crate::http_engine::HttpSynthesizer::new())
        });
        registry
    }

    pub fn register_transcriber(&mut self, name: &str, factory: fn() -> Box<dyn SpeechToText>) {
        self.transcribers.insert(name.to_string(), factory);
    }

    pub fn register_synthesizer(&mut self, name: &str, factory: fn() -> Box<dyn SpeechSynthesis>) {
        self.synthesizers.insert(name.to_string(), factory);
    }

    pub fn create_transcriber(&self, name: &str) -> Result<Box<dyn SpeechToText>, EngineError> {
        self.transcribers
            .get(name)
            .map(|f| f())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    pub fn create_synthesizer(&self, name: &str) -> Result<Box<dyn SpeechSynthesis>, EngineError> {
        self.synthesizers
            .get(name)
            .map(|f| f())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    /// Creates and initializes the transcriber named by `config`.
    pub async fn build_transcriber(
        &self,
        config: &EngineConfig,
    ) -> Result<Box<dyn SpeechToText>, EngineError> {
        let mut engine = self.create_transcriber(&config.engine)?;
        engine.initialize(config.extra.clone()).await?;
        Ok(engine)
    }

    /// Creates and initializes the synthesizer named by `config`.
    pub async fn build_synthesizer(
        &self,
        config: &EngineConfig,
    ) -> Result<Box<dyn SpeechSynthesis>, EngineError> {
        let mut engine = self.create_synthesizer(&config.engine)?;
        engine.initialize(config.extra.clone()).await?;
        Ok(engine)
    }

    pub fn list_transcribers(&self) -> Vec<&str> {
        self.transcribers.keys().map(|s| s.as_str()).collect()
    }

    pub fn list_synthesizers(&self) -> Vec<&str> {
        self.synthesizers.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullTranscriber;

    #[test]
    fn test_registry_new_has_null_engines() {
        let registry = EngineRegistry::new();
        assert!(registry.create_transcriber("null").is_ok());
        assert!(registry.create_synthesizer("null").is_ok());
    }

    #[test]
    fn test_registry_create_http_returns_correct_name() {
        let registry = EngineRegistry::new();
        assert_eq!(registry.create_transcriber("http").unwrap().name(), "http");
        assert_eq!(registry.create_synthesizer("http").unwrap().name(), "http");
    }

    #[test]
    fn test_registry_create_unknown_returns_error() {
        let registry = EngineRegistry::new();
        match registry.create_transcriber("nope") {
            Err(EngineError::NotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected NotFound error"),
        }
        match registry.create_synthesizer("mms") {
            Err(EngineError::NotFound(name)) => assert_eq!(name, "mms"),
            _ => panic!("expected NotFound error"),
        }
    }

    #[test]
    fn test_registry_register_custom_transcriber() {
        let mut registry = EngineRegistry::new();
        registry.register_transcriber("custom", || Box::new(NullTranscriber::with_text("hi")));
        let engine = registry.create_transcriber("custom").unwrap();
        // factory builds a NullTranscriber, so the name is still "null"
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_registry_lists_builtin_engines() {
        let registry = EngineRegistry::new();
        let mut stt = registry.list_transcribers();
        stt.sort();
        assert_eq!(stt, vec!["http", "null"]);
        let mut tts = registry.list_synthesizers();
        tts.sort();
        assert_eq!(tts, vec!["http", "null"]);
    }

    #[tokio::test]
    async fn test_registry_build_passes_extra_config() {
        let registry = EngineRegistry::new();
        let config: EngineConfig = toml::from_str(
            r#"
engine = "null"
sample_rate = 22050
"#,
        )
        .unwrap();
        let engine = registry.build_synthesizer(&config).await.unwrap();
        assert_eq!(engine.sample_rate(), 22050);
    }

    #[tokio::test]
    async fn test_registry_build_surfaces_init_error() {
        let registry = EngineRegistry::new();
        let config = EngineConfig {
            engine: "http".to_string(),
            extra: toml::Value::Table(Default::default()),
        };
        let result = registry.build_transcriber(&config).await;
        assert!(matches!(result, Err(EngineError::InitializationFailed(_))));
    }
}
