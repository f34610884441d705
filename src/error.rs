//! Error types for the healthlens library.
//!
//! One enum covers the whole pipeline. Every stage classifies its failure
//! and rethrows — there is no retry anywhere, and no partial or degraded
//! `AnalysisData` is ever substituted for a failed analysis. Only the
//! presentation boundary (the CLI, or whatever embeds the library) turns an
//! error into a user-visible message, via [`HealthLensError::user_message`];
//! the technical detail in the `Display` output is for logs.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the healthlens library.
#[derive(Debug, Error)]
pub enum HealthLensError {
    // ── Input / encoding errors ───────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exceeds the configured upload limit.
    #[error("Document is {size} bytes, which exceeds the {limit}-byte limit.\nSupported: JPEG, PNG, PDF up to 10 MiB.")]
    FileTooLarge { size: u64, limit: u64 },

    /// The file's magic bytes match none of the supported media types.
    #[error("Unsupported document type (first bytes: {magic:?}).\nSupported formats: PNG, JPEG, PDF.")]
    UnsupportedMediaType { magic: [u8; 4] },

    /// Reading or base64-wrapping the document failed.
    #[error("Failed to encode document: {detail}")]
    Encoding { detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// No API key is configured for the selected provider.
    #[error("No API key configured for provider '{provider}'.\nSet {env_var} and try again.")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Network-level failure talking to the provider (DNS, TLS, timeout).
    #[error("Network error talking to '{provider}': {detail}")]
    Transport {
        provider: &'static str,
        detail: String,
    },

    /// The provider returned a non-success HTTP status.
    #[error("Provider '{provider}' returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider rejected the credentials (401/403).
    #[error("Authentication failed for provider '{provider}': check the API key")]
    Auth { provider: &'static str },

    /// HTTP 429 from the provider.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimited { provider: &'static str },

    // ── Normalization errors ──────────────────────────────────────────────
    /// The provider returned no payload at all.
    #[error("Provider '{provider}' returned an empty response")]
    EmptyResponse { provider: &'static str },

    /// Payload was present but does not match the canonical analysis schema.
    ///
    /// Guessing or defaulting medical data is unacceptable, so this is
    /// always a hard failure, never a fallback to sample findings.
    #[error("Provider response is not a valid analysis: {detail}")]
    MalformedAnalysis { detail: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// The requested report region does not exist.
    #[error("Unknown report region '{region}'.\nValid regions: full-report, summary, findings, terms, recommendations.")]
    RenderTargetNotFound { region: String },

    /// PDF rendering or writing the output file failed.
    #[error("Failed to export report: {detail}")]
    Export { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HealthLensError {
    /// The generic, non-technical message shown to end users.
    ///
    /// The full error detail never reaches the user — it goes to the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            HealthLensError::RenderTargetNotFound { .. } | HealthLensError::Export { .. } => {
                "Failed to generate PDF. Please try again."
            }
            HealthLensError::FileTooLarge { .. } | HealthLensError::UnsupportedMediaType { .. } => {
                "This file cannot be analyzed. Upload a JPEG, PNG, or PDF up to 10 MB."
            }
            _ => "Failed to analyze the document. Please try again.",
        }
    }
}
