use crate::error::ConfigError;
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    pub translation: TranslationConfig,

    pub fallback_asr: FallbackAsrConfig,

    #[serde(default = "default_transcriber")]
    pub transcriber: EngineConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub engines: EnginesConfig,

    #[serde(default)]
    pub reply: ReplyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Parent directory for per-run scratch directories.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_url")]
    pub url: String,

    pub username: String,

    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    #[serde(default = "default_translation_timeout")]
    pub timeout_secs: u64,
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackAsrConfig {
    pub url: String,

    #[serde(default = "default_fallback_timeout")]
    pub timeout_secs: u64,
}

impl FallbackAsrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Selects an engine by registry name; the remaining keys are handed to the engine.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub engine: String,

    #[serde(flatten)]
    pub extra: toml::Value,
}

impl EngineConfig {
    pub fn null() -> Self {
        Self {
            engine: "null".to_string(),
            extra: toml::Value::Table(Default::default()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    #[serde(default = "EngineConfig::null")]
    pub english: EngineConfig,

    #[serde(default = "EngineConfig::null")]
    pub khmer: EngineConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            english: EngineConfig::null(),
            khmer: EngineConfig::null(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnginesConfig {
    /// Upper bound on a single inference call.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

impl EnginesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_engine_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    #[serde(default = "default_sink")]
    pub sink: String,

    #[serde(flatten)]
    pub extra: toml::Value,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            extra: toml::Value::Table(Default::default()),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_translation_url() -> String {
    "https://translatekh.mptc.gov.kh/api".to_string()
}

fn default_translation_timeout() -> u64 {
    30
}

fn default_fallback_timeout() -> u64 {
    30
}

fn default_engine_timeout() -> u64 {
    120
}

fn default_transcriber() -> EngineConfig {
    EngineConfig::null()
}

fn default_sink() -> String {
    "log".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern is valid");
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.translation.username.trim().is_empty() {
            return Err(invalid("translation.username", "must not be empty"));
        }
        let url = &self.translation.url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(invalid("translation.url", format!("not an http(s) URL: {url}")));
        }
        let url = &self.fallback_asr.url;
        if !(url.starts_with("wss://") || url.starts_with("ws://")) {
            return Err(invalid("fallback_asr.url", format!("not a ws(s) URL: {url}")));
        }
        for (key, secs) in [
            ("translation.timeout_secs", self.translation.timeout_secs),
            ("fallback_asr.timeout_secs", self.fallback_asr.timeout_secs),
            ("engines.timeout_secs", self.engines.timeout_secs),
        ] {
            if secs == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const MINIMAL: &str = r#"
[translation]
username = "user"
password = "pass"

[fallback_asr]
url = "wss://asr.example.com/stream"
"#;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
scratch_dir = "/var/tmp/transkh"

[translation]
url = "https://translate.example.com/api"
username = "alice"
password = "hunter2"
timeout_secs = 10

[fallback_asr]
url = "wss://asr.example.com/stream"
timeout_secs = 15

[transcriber]
engine = "http"
url = "http://127.0.0.1:8090"

[synthesis.english]
engine = "http"
url = "http://127.0.0.1:8091"
sample_rate = 16000

[synthesis.khmer]
engine = "null"

[engines]
timeout_secs = 60

[reply]
sink = "file"
path = "./replies"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.scratch_dir, PathBuf::from("/var/tmp/transkh"));
        assert_eq!(config.translation.url, "https://translate.example.com/api");
        assert_eq!(config.translation.username, "alice");
        assert_eq!(config.translation.password.expose_secret(), "hunter2");
        assert_eq!(config.translation.timeout(), Duration::from_secs(10));
        assert_eq!(config.fallback_asr.timeout(), Duration::from_secs(15));
        assert_eq!(config.transcriber.engine, "http");
        assert_eq!(
            config.transcriber.extra.get("url").and_then(|v| v.as_str()),
            Some("http://127.0.0.1:8090")
        );
        assert_eq!(config.synthesis.english.engine, "http");
        assert_eq!(
            config
                .synthesis
                .english
                .extra
                .get("sample_rate")
                .and_then(|v| v.as_integer()),
            Some(16000)
        );
        assert_eq!(config.synthesis.khmer.engine, "null");
        assert_eq!(config.engines.timeout(), Duration::from_secs(60));
        assert_eq!(config.reply.sink, "file");
        assert_eq!(
            config.reply.extra.get("path").and_then(|v| v.as_str()),
            Some("./replies")
        );
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.scratch_dir, std::env::temp_dir());
        assert_eq!(config.translation.url, "https://translatekh.mptc.gov.kh/api");
        assert_eq!(config.translation.timeout_secs, 30);
        assert_eq!(config.fallback_asr.timeout_secs, 30);
        assert_eq!(config.engines.timeout_secs, 120);
        assert_eq!(config.transcriber.engine, "null");
        assert_eq!(config.synthesis.english.engine, "null");
        assert_eq!(config.synthesis.khmer.engine, "null");
        assert_eq!(config.reply.sink, "log");
    }

    #[test]
    fn test_config_missing_required_section_fails() {
        let toml_str = r#"
[translation]
username = "user"
password = "pass"
"#;
        let result = AppConfig::from_toml_str(toml_str);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("TRANSKH_TEST_PASSWORD", "secret123");
        let toml_str = r#"
[translation]
username = "user"
password = "${TRANSKH_TEST_PASSWORD}"

[fallback_asr]
url = "wss://asr.example.com/stream"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.translation.password.expose_secret(), "secret123");
        std::env::remove_var("TRANSKH_TEST_PASSWORD");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[translation]
username = "${DEFINITELY_DOES_NOT_EXIST_12345}"
password = "pass"

[fallback_asr]
url = "wss://asr.example.com/stream"
"#;
        let result = AppConfig::from_toml_str(toml_str);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_password_is_redacted_in_debug() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        let debug = format!("{:?}", config.translation);
        assert!(!debug.contains("pass\""));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let result = AppConfig::from_toml_str("this is not valid toml [[[");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_non_websocket_fallback_url() {
        let toml_str = r#"
[translation]
username = "user"
password = "pass"

[fallback_asr]
url = "https://asr.example.com/stream"
"#;
        match AppConfig::from_toml_str(toml_str) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "fallback_asr.url"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_config_rejects_empty_username() {
        let toml_str = r#"
[translation]
username = ""
password = "pass"

[fallback_asr]
url = "ws://127.0.0.1:9000"
"#;
        match AppConfig::from_toml_str(toml_str) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "translation.username"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let toml_str = r#"
[translation]
username = "user"
password = "pass"

[fallback_asr]
url = "ws://127.0.0.1:9000"
timeout_secs = 0
"#;
        match AppConfig::from_toml_str(toml_str) {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "fallback_asr.timeout_secs")
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("transkh_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.translation.username, "user");
        assert_eq!(config.fallback_asr.url, "wss://asr.example.com/stream");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }
}
