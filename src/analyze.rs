//! Analysis entry points: the facade the presentation layer calls.
//!
//! One analysis is a strictly sequential chain — resolve provider, encode,
//! call, normalize — with a single result or a single classified error.
//! Nothing here retries, caches, or coalesces: the system assumes
//! single-flight usage (the caller disables its trigger while an analysis
//! is loading), so there is no per-document locking or deduplication.
//!
//! Provider selection is a pure dispatch on `config.provider`, decided once
//! at process start. Switching the flag changes which client runs and which
//! tag the normalizer sees; the contract of [`analyze_document`] is
//! otherwise identical for both providers.

use crate::config::AnalysisConfig;
use crate::error::HealthLensError;
use crate::model::AnalysisData;
use crate::pipeline::{encode, normalize, provider};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Analyze a medical document on disk.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Fails fast on a missing API key, then on any encoding, transport, or
/// normalization failure. No partial `AnalysisData` is ever returned.
pub async fn analyze_document(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisData, HealthLensError> {
    let start = Instant::now();
    let input = input.as_ref();
    info!(provider = config.provider.name(), "Starting analysis: {}", input.display());

    // Credential check happens before any file or network work.
    let client = provider::create_provider(config)?;

    let encoded = encode::encode_file(input, config.max_file_bytes).await?;
    debug!(media_type = encoded.media_type, bytes = encoded.len, "Document encoded");

    let raw = client.analyze(&encoded, config).await?;
    let data = normalize::normalize(raw)?;

    info!(
        findings = data.findings.len(),
        terms = data.terms.len(),
        recommendations = data.recommendations.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Analysis complete: {}",
        data.document_type
    );
    Ok(data)
}

/// Analyze in-memory document bytes.
///
/// Useful when the document comes from a network stream or buffer rather
/// than a file on disk; the media type is sniffed from the bytes.
pub async fn analyze_bytes(
    bytes: &[u8],
    config: &AnalysisConfig,
) -> Result<AnalysisData, HealthLensError> {
    let client = provider::create_provider(config)?;
    let encoded = encode::encode_bytes(bytes, config.max_file_bytes)?;
    let raw = client.analyze(&encoded, config).await?;
    normalize::normalize(raw)
}

/// Synchronous wrapper around [`analyze_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_document_sync(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisData, HealthLensError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| HealthLensError::Encoding {
            detail: format!("Failed to create tokio runtime: {e}"),
        })?
        .block_on(analyze_document(input, config))
}
