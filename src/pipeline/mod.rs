//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and keeps the network
//! I/O confined to one module.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ provider ──▶ normalize
//! (base64)   (chat API)   (canonical schema)
//! ```
//!
//! 1. [`encode`]    — validate and base64-wrap the uploaded document as a
//!    data URI for the multimodal request body
//! 2. [`provider`]  — call the configured vision provider; the only stage
//!    with network I/O. OpenAI is single-shot; Groq runs the two-phase
//!    extract-then-format pipeline
//! 3. [`normalize`] — unwrap the provider-shaped response and parse it into
//!    [`crate::model::AnalysisData`], failing loudly on anything malformed
//!
//! The chain is strictly sequential — one analysis in flight at a time, no
//! shared mutable state, no retries.

pub mod encode;
pub mod normalize;
pub mod provider;
