//! Configuration types for document analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`] or loaded from the environment once at startup
//! with [`AnalysisConfig::from_env`]. The struct is constructed once and
//! passed by reference into the facade, the provider clients, and the
//! exporter — pipeline code never reads ambient global state.
//!
//! # Design choice: builder over constructor
//! Callers set only what they care about and rely on documented defaults
//! for the rest; adding a knob later does not break existing call sites.

use crate::error::HealthLensError;
use std::fmt;

/// Default upload limit: 10 MiB, matching the uploader contract.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Which hosted provider performs the analysis.
///
/// Selected once at process start; a request never switches provider
/// mid-flight. The normalizer dispatches on the same tag, so switching the
/// flag changes which client runs and how its response is unwrapped, and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// OpenAI vision, single-shot request. (default)
    #[default]
    OpenAi,
    /// Groq vision, two-phase extract-then-format pipeline.
    Groq,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
        }
    }

    /// Default vision model for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Groq => "llama-3.2-11b-vision-preview",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = HealthLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "groq" => Ok(ProviderKind::Groq),
            other => Err(HealthLensError::InvalidConfig(format!(
                "Unknown provider '{other}'. Use: openai, groq"
            ))),
        }
    }
}

/// Configuration for one analysis run.
///
/// Built via [`AnalysisConfig::builder()`], [`AnalysisConfig::from_env()`],
/// or [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use healthlens::{AnalysisConfig, ProviderKind};
///
/// let config = AnalysisConfig::builder()
///     .provider(ProviderKind::Groq)
///     .groq_api_key("gsk-test")
///     .max_tokens(1024)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Active provider. Default: [`ProviderKind::OpenAi`].
    pub provider: ProviderKind,

    /// OpenAI API key. Read from `OPENAI_API_KEY` by `from_env`.
    pub openai_api_key: Option<String>,

    /// Groq API key. Read from `GROQ_API_KEY` by `from_env`.
    pub groq_api_key: Option<String>,

    /// Model identifier override. If `None`, the provider default is used
    /// (`gpt-4o` for OpenAI, `llama-3.2-11b-vision-preview` for Groq).
    pub model: Option<String>,

    /// Sampling temperature for the extraction call. Default: 1.0.
    ///
    /// The Groq formatting call always runs at temperature 0 regardless of
    /// this setting — reformatting must be deterministic.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 1500.
    pub max_tokens: usize,

    /// Upload size limit in bytes. Default: 10 MiB.
    pub max_file_bytes: u64,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Override for the OpenAI-compatible endpoint base URL (tests, proxies).
    pub openai_base_url: Option<String>,

    /// Override for the Groq endpoint base URL (tests, proxies).
    pub groq_base_url: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            openai_api_key: None,
            groq_api_key: None,
            model: None,
            temperature: 1.0,
            max_tokens: 1500,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            api_timeout_secs: 60,
            openai_base_url: None,
            groq_base_url: None,
        }
    }
}

// API keys must never appear in logs, so Debug is written by hand.
impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider", &self.provider)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads `HEALTHLENS_PROVIDER` (`openai` or `groq`; defaults to `openai`
    /// unless only a Groq key is present), `HEALTHLENS_MODEL`,
    /// `OPENAI_API_KEY`, and `GROQ_API_KEY`. Intended to be called once at
    /// process start; the result is read-only thereafter.
    pub fn from_env() -> Result<Self, HealthLensError> {
        let openai_key = non_empty_env("OPENAI_API_KEY");
        let groq_key = non_empty_env("GROQ_API_KEY");

        let provider = match non_empty_env("HEALTHLENS_PROVIDER") {
            Some(name) => name.parse()?,
            // Only a Groq key configured → use Groq without further ceremony.
            None if openai_key.is_none() && groq_key.is_some() => ProviderKind::Groq,
            None => ProviderKind::OpenAi,
        };

        Ok(Self {
            provider,
            openai_api_key: openai_key,
            groq_api_key: groq_key,
            model: non_empty_env("HEALTHLENS_MODEL"),
            ..Self::default()
        })
    }

    /// The API key for the active provider, if configured.
    pub fn active_api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Groq => self.groq_api_key.as_deref(),
        }
    }

    /// The model identifier to send for the active provider.
    pub fn active_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    pub fn groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.groq_api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_file_bytes(mut self, n: u64) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.openai_base_url = Some(url.into());
        self
    }

    pub fn groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.groq_base_url = Some(url.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, HealthLensError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(HealthLensError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(HealthLensError::InvalidConfig(
                "max_file_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
