//! Vision provider clients: OpenAI (single-shot) and Groq (two-phase).
//!
//! Both speak the chat-completions wire format over HTTPS with bearer auth,
//! but they differ in call structure:
//!
//! * **OpenAI** issues one request carrying the full schema contract in the
//!   system prompt plus the encoded image, and returns the message content.
//!
//! * **Groq** runs a two-phase pipeline: an extraction call that reads the
//!   image, then a formatting call at temperature 0 that reshapes the
//!   extraction into strict JSON. Vision models are unreliable at emitting
//!   machine-parseable structure in the same pass that reads a varied
//!   document layout; splitting "extract" from "format" is what makes the
//!   structured output dependable. The [`Extraction`] newtype is the only
//!   ticket into the formatting phase, so phase 2 cannot run before phase 1
//!   has fully completed.
//!
//! Failure semantics: transport errors, non-success statuses, bad
//! credentials, and rate limits are classified here and propagated
//! unchanged. There is no retry and no partial result — a failed call is a
//! failed analysis.

use crate::config::{AnalysisConfig, ProviderKind};
use crate::error::HealthLensError;
use crate::pipeline::encode::EncodedDocument;
use crate::prompts;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

// ── Wire types ────────────────────────────────────────────────────────────

/// Chat-completions request body, shared by both providers.
///
/// OpenAI takes `max_tokens`; Groq vision models take
/// `max_completion_tokens`. Exactly one of the two is set per request.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<usize>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying an instruction plus the encoded document.
    pub fn user_with_image(text: impl Into<String>, doc: &EncodedDocument) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: doc.data_uri.clone(),
                    },
                },
            ]),
        }
    }
}

/// Either a plain string or multimodal content parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Chat-completion envelope as returned by both providers.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletion {
    /// The first choice's content, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// Raw, provider-shaped analysis response.
///
/// The two providers wrap their payload differently, so the normalizer
/// dispatches on this tag instead of duck-probing fields: the OpenAI client
/// hands back the message content already unwrapped, while the Groq client
/// hands back the whole envelope from its formatting phase.
#[derive(Debug, Clone)]
pub enum RawProviderResponse {
    OpenAi(Option<String>),
    Groq(Option<ChatCompletion>),
}

impl RawProviderResponse {
    pub fn provider(&self) -> ProviderKind {
        match self {
            RawProviderResponse::OpenAi(_) => ProviderKind::OpenAi,
            RawProviderResponse::Groq(_) => ProviderKind::Groq,
        }
    }
}

// ── Provider trait ────────────────────────────────────────────────────────

/// A hosted vision API that accepts an encoded document and an instruction
/// prompt and returns model output.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Analyze one encoded document. Strictly sequential; no retry.
    async fn analyze(
        &self,
        doc: &EncodedDocument,
        config: &AnalysisConfig,
    ) -> Result<RawProviderResponse, HealthLensError>;
}

impl std::fmt::Debug for dyn VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProvider")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Instantiate the client for the configured provider.
///
/// A missing credential fails here, before any file is read or request
/// built, rather than as a confusing 401 later.
pub fn create_provider(
    config: &AnalysisConfig,
) -> Result<Box<dyn VisionProvider>, HealthLensError> {
    let key = config
        .active_api_key()
        .ok_or(HealthLensError::MissingApiKey {
            provider: config.provider.name(),
            env_var: config.provider.key_env_var(),
        })?
        .to_string();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .build()
        .map_err(|e| HealthLensError::Transport {
            provider: config.provider.name(),
            detail: e.to_string(),
        })?;

    Ok(match config.provider {
        ProviderKind::OpenAi => {
            let mut c = OpenAiClient::new(http, key);
            if let Some(ref url) = config.openai_base_url {
                c = c.with_base_url(url.clone());
            }
            Box::new(c)
        }
        ProviderKind::Groq => {
            let mut c = GroqClient::new(http, key);
            if let Some(ref url) = config.groq_base_url {
                c = c.with_base_url(url.clone());
            }
            Box::new(c)
        }
    })
}

// ── Shared HTTP call ──────────────────────────────────────────────────────

async fn send_chat(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    provider: &'static str,
    body: &ChatRequest,
) -> Result<ChatCompletion, HealthLensError> {
    let url = format!("{base_url}/v1/chat/completions");
    debug!(provider, model = %body.model, "Calling chat-completions endpoint");

    let resp = http
        .post(&url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| HealthLensError::Transport {
            provider,
            detail: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                HealthLensError::Auth { provider }
            }
            StatusCode::TOO_MANY_REQUESTS => HealthLensError::RateLimited { provider },
            _ => HealthLensError::Api {
                provider,
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            },
        });
    }

    resp.json::<ChatCompletion>()
        .await
        .map_err(|e| HealthLensError::Transport {
            provider,
            detail: format!("decoding response body: {e}"),
        })
}

// ── OpenAI client (single-shot) ───────────────────────────────────────────

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Build the single-shot request body.
    fn build_request(doc: &EncodedDocument, config: &AnalysisConfig) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::system(prompts::openai_system_prompt()),
                ChatMessage::user_with_image(prompts::OPENAI_USER_PROMPT, doc),
            ],
            model: config.active_model().to_string(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            max_completion_tokens: None,
            stream: false,
        }
    }
}

#[async_trait]
impl VisionProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn analyze(
        &self,
        doc: &EncodedDocument,
        config: &AnalysisConfig,
    ) -> Result<RawProviderResponse, HealthLensError> {
        let body = Self::build_request(doc, config);
        let completion =
            send_chat(&self.http, &self.base_url, &self.api_key, "openai", &body).await?;

        Ok(RawProviderResponse::OpenAi(
            completion.content().map(str::to_string),
        ))
    }
}

// ── Groq client (two-phase) ───────────────────────────────────────────────

/// Output of the Groq extraction phase.
///
/// Owning one of these is proof that phase 1 completed — `format_request`
/// consumes it, so the formatting call can never be issued first.
pub struct Extraction(String);

impl Extraction {
    pub fn text(&self) -> &str {
        &self.0
    }
}

pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: GROQ_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Phase 1: read the image and extract everything on it.
    fn extract_request(doc: &EncodedDocument, config: &AnalysisConfig) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user_with_image(
                prompts::GROQ_EXTRACTION_PROMPT,
                doc,
            )],
            model: config.active_model().to_string(),
            temperature: config.temperature,
            max_tokens: None,
            max_completion_tokens: Some(config.max_tokens),
            stream: false,
        }
    }

    /// Phase 2: reformat the extraction into strict JSON.
    ///
    /// Temperature is pinned to 0 — reformatting must not be creative.
    fn format_request(extraction: Extraction, config: &AnalysisConfig) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user(prompts::format_instruction(
                extraction.text(),
            ))],
            model: config.active_model().to_string(),
            temperature: 0.0,
            max_tokens: None,
            max_completion_tokens: Some(config.max_tokens),
            stream: false,
        }
    }

    async fn extract(
        &self,
        doc: &EncodedDocument,
        config: &AnalysisConfig,
    ) -> Result<Extraction, HealthLensError> {
        let body = Self::extract_request(doc, config);
        let completion =
            send_chat(&self.http, &self.base_url, &self.api_key, "groq", &body).await?;

        match completion.content() {
            Some(text) if !text.trim().is_empty() => Ok(Extraction(text.to_string())),
            _ => Err(HealthLensError::EmptyResponse { provider: "groq" }),
        }
    }

    async fn format(
        &self,
        extraction: Extraction,
        config: &AnalysisConfig,
    ) -> Result<ChatCompletion, HealthLensError> {
        let body = Self::format_request(extraction, config);
        send_chat(&self.http, &self.base_url, &self.api_key, "groq", &body).await
    }
}

#[async_trait]
impl VisionProvider for GroqClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    async fn analyze(
        &self,
        doc: &EncodedDocument,
        config: &AnalysisConfig,
    ) -> Result<RawProviderResponse, HealthLensError> {
        // Phase 2 starts only after phase 1's output is fully available.
        let extraction = self.extract(doc, config).await?;
        debug!(
            chars = extraction.text().len(),
            "Groq extraction complete, formatting"
        );
        let envelope = self.format(extraction, config).await?;

        Ok(RawProviderResponse::Groq(Some(envelope)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_bytes_default;

    fn test_doc() -> EncodedDocument {
        encode_bytes_default(&[0x89, b'P', b'N', b'G', 1, 2, 3]).unwrap()
    }

    fn test_config(provider: ProviderKind) -> AnalysisConfig {
        AnalysisConfig::builder()
            .provider(provider)
            .openai_api_key("sk-test")
            .groq_api_key("gsk-test")
            .build()
            .unwrap()
    }

    #[test]
    fn openai_body_uses_max_tokens_and_embeds_image() {
        let config = test_config(ProviderKind::OpenAi);
        let body = OpenAiClient::build_request(&test_doc(), &config);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["stream"], false);
        assert_eq!(json["max_tokens"], 1500);
        assert!(json.get("max_completion_tokens").is_none());

        // system + user, with the image as a data-URI content part
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        let parts = json["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        let url = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn groq_extract_body_uses_max_completion_tokens() {
        let config = test_config(ProviderKind::Groq);
        let body = GroqClient::extract_request(&test_doc(), &config);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "llama-3.2-11b-vision-preview");
        assert_eq!(json["stream"], false);
        assert_eq!(json["max_completion_tokens"], 1500);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn groq_format_body_is_text_only_at_temperature_zero() {
        let config = test_config(ProviderKind::Groq);
        let body = GroqClient::format_request(Extraction("LDL 130".into()), &config);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["stream"], false);
        // Single text message, no image parts.
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        let content = messages[0]["content"].as_str().unwrap();
        assert!(content.contains("LDL 130"));
        assert!(content.contains("\"status\""));
    }

    #[test]
    fn create_provider_fails_fast_without_key() {
        let config = AnalysisConfig::builder()
            .provider(ProviderKind::Groq)
            .build()
            .unwrap();
        let err = create_provider(&config).unwrap_err();
        assert!(matches!(
            err,
            HealthLensError::MissingApiKey {
                provider: "groq",
                env_var: "GROQ_API_KEY"
            }
        ));
    }

    #[test]
    fn create_provider_dispatches_on_flag() {
        let openai = create_provider(&test_config(ProviderKind::OpenAi)).unwrap();
        assert_eq!(openai.kind(), ProviderKind::OpenAi);

        let groq = create_provider(&test_config(ProviderKind::Groq)).unwrap();
        assert_eq!(groq.kind(), ProviderKind::Groq);
    }

    #[test]
    fn envelope_content_unwraps_first_choice() {
        let envelope: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"hello"}},{"message":{"content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.content(), Some("hello"));

        let empty: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.content(), None);
    }

    #[test]
    fn raw_response_carries_provider_tag() {
        assert_eq!(
            RawProviderResponse::OpenAi(None).provider(),
            ProviderKind::OpenAi
        );
        assert_eq!(
            RawProviderResponse::Groq(None).provider(),
            ProviderKind::Groq
        );
    }
}
