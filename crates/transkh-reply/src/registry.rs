use crate::sink_trait::ReplySink;
use std::collections::HashMap;
use transkh_core::ReplyError;

pub struct SinkRegistry {
    factories: HashMap<String, fn() -> Box<dyn ReplySink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("file", || Box::new(crate::file_sink::FileSink::new()));
        registry.register("log", || Box::new(crate::log_sink::LogSink::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn ReplySink>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn ReplySink>, ReplyError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| ReplyError::NotFound(name.to_string()))
    }

    /// Creates the named sink and initializes it with `config`.
    pub async fn build(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Box<dyn ReplySink>, ReplyError> {
        let mut sink = self.create(name)?;
        sink.initialize(config).await?;
        Ok(sink)
    }

    pub fn list_sinks(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
