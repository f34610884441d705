//! Document encoding: raw bytes → base64 data URI.
//!
//! Vision APIs accept images as base64 data URIs embedded in the JSON
//! request body. The media type is sniffed from magic bytes rather than the
//! file extension, so a `.png` that is really a JPEG is still labelled
//! correctly and anything outside the PNG/JPEG/PDF allow-list is rejected
//! before a single network byte is spent on it. The read is a single
//! buffered `tokio::fs::read` — no streaming, no partial reads, no retry.

use crate::config::DEFAULT_MAX_FILE_BYTES;
use crate::error::HealthLensError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// A document encoded for inclusion in a provider request body.
#[derive(Debug, Clone)]
pub struct EncodedDocument {
    /// `data:<mime>;base64,<payload>` — ready for an `image_url` part.
    pub data_uri: String,
    /// Sniffed media type: `image/png`, `image/jpeg`, or `application/pdf`.
    pub media_type: &'static str,
    /// Original byte length, for logging.
    pub len: u64,
}

/// Read a document from disk and encode it.
///
/// The size cap is enforced from file metadata before the read, so an
/// oversize file is rejected without ever being buffered.
pub async fn encode_file(
    path: impl AsRef<Path>,
    max_bytes: u64,
) -> Result<EncodedDocument, HealthLensError> {
    let path = path.as_ref();

    let meta = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HealthLensError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => HealthLensError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => HealthLensError::Encoding {
            detail: e.to_string(),
        },
    })?;

    if meta.len() > max_bytes {
        return Err(HealthLensError::FileTooLarge {
            size: meta.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| HealthLensError::Encoding {
            detail: format!("reading '{}': {e}", path.display()),
        })?;

    encode_bytes(&bytes, max_bytes)
}

/// Encode an in-memory document.
pub fn encode_bytes(bytes: &[u8], max_bytes: u64) -> Result<EncodedDocument, HealthLensError> {
    if bytes.len() as u64 > max_bytes {
        return Err(HealthLensError::FileTooLarge {
            size: bytes.len() as u64,
            limit: max_bytes,
        });
    }

    let media_type = sniff_media_type(bytes)?;
    let payload = STANDARD.encode(bytes);
    debug!(media_type, "Encoded document → {} bytes base64", payload.len());

    Ok(EncodedDocument {
        data_uri: format!("data:{media_type};base64,{payload}"),
        media_type,
        len: bytes.len() as u64,
    })
}

/// Convenience wrapper using the default 10 MiB cap.
pub fn encode_bytes_default(bytes: &[u8]) -> Result<EncodedDocument, HealthLensError> {
    encode_bytes(bytes, DEFAULT_MAX_FILE_BYTES)
}

/// Identify the media type from magic bytes.
///
/// PNG: `\x89PNG`. JPEG: SOI marker `\xFF\xD8\xFF`. PDF: `%PDF`.
fn sniff_media_type(bytes: &[u8]) -> Result<&'static str, HealthLensError> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Ok("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok("image/jpeg");
    }
    if bytes.starts_with(b"%PDF") {
        return Ok("application/pdf");
    }

    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(HealthLensError::UnsupportedMediaType { magic })
}
