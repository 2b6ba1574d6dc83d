use async_trait::async_trait;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use transkh_core::config::TranslationConfig;
use transkh_core::{Language, TranslationError, TranslationRequest, TranslationResult};

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError>;

    async fn translate_to_khmer(&self, text: &str) -> Result<String, TranslationError> {
        let request = TranslationRequest::new(text, Language::English);
        Ok(self.translate(&request).await?.translated_text)
    }

    async fn translate_to_english(&self, text: &str) -> Result<String, TranslationError> {
        let request = TranslationRequest::new(text, Language::Khmer);
        Ok(self.translate(&request).await?.translated_text)
    }
}

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    input_text: [&'a str; 1],
    src_lang: &'a str,
    tgt_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translate_text: Option<serde_json::Value>,
}

impl TranslateResponse {
    /// First element of `translate_text` when it is a non-empty string.
    fn first_text(self) -> Option<String> {
        match self.translate_text? {
            serde_json::Value::Array(items) => match items.into_iter().next()? {
                serde_json::Value::String(text) if !text.is_empty() => Some(text),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Client for the Translate KH REST service.
pub struct TranslationClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: SecretString,
}

impl TranslationClient {
    pub fn new(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TranslationError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `Basic base64(username:password)`.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

#[async_trait]
impl Translator for TranslationClient {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslationError> {
        let body = TranslateBody {
            input_text: [request.text.as_str()],
            src_lang: request.source.code(),
            tgt_lang: request.target.code(),
        };

        let response = self
            .client
            .post(&self.url)
            .header(
                reqwest::header::AUTHORIZATION,
                basic_auth_header(&self.username, self.password.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(src = body.src_lang, tgt = body.tgt_lang, "translation request failed: {e}");
                TranslationError::Transport(e.to_string())
            })?;

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Transport(format!("undecodable response: {e}")))?;

        let translated_text = parsed.first_text().ok_or_else(|| {
            tracing::error!(src = body.src_lang, tgt = body.tgt_lang, "empty or invalid translation result");
            TranslationError::Empty
        })?;

        tracing::debug!(
            src = body.src_lang,
            tgt = body.tgt_lang,
            chars = translated_text.chars().count(),
            "translation received"
        );
        Ok(TranslationResult {
            source_text: request.text.clone(),
            source: request.source,
            target: request.target,
            translated_text,
        })
    }
}
