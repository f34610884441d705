//! # healthlens
//!
//! Analyze medical documents (lab reports, prescriptions, imaging results)
//! with vision language models and turn them into a structured, patient-
//! friendly report.
//!
//! ## Why this crate?
//!
//! Medical documents arrive as photos and scans full of jargon, reference
//! ranges, and abbreviations. Instead of OCR plus brittle heuristics, this
//! crate sends the image to a vision model and normalizes the answer into
//! one strict schema — document type, summary, per-finding status, plain-
//! language term explanations, and recommendations. A response that does
//! not satisfy the schema is an error, never silently substituted data.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document (PNG / JPEG / PDF, ≤ 10 MiB)
//!  │
//!  ├─ 1. Encode     magic-byte sniff + base64 data URI
//!  ├─ 2. Provider   OpenAI (single-shot) or Groq (extract → format)
//!  ├─ 3. Normalize  strict parse into AnalysisData
//!  ├─ 4. Report     deterministic plain-text rendering by region
//!  └─ 5. Export     optional paginated A4 PDF via printpdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthlens::{analyze_document, render, AnalysisConfig, ReportRegion};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / GROQ_API_KEY
//!     let config = AnalysisConfig::from_env()?;
//!     let data = analyze_document("lab-results.png", &config).await?;
//!     println!("{}", render(&data, ReportRegion::FullReport));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `healthlens` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! healthlens = { version = "0.1", default-features = false }
//! ```
//!
//! ## Disclaimer
//!
//! Output is informational and never a diagnosis; reports carry that caveat
//! and users are always pointed back to a healthcare professional.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_bytes, analyze_document, analyze_document_sync};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ProviderKind, DEFAULT_MAX_FILE_BYTES};
pub use error::HealthLensError;
pub use export::generate_document;
pub use model::{AnalysisData, Finding, FindingStatus, Term};
pub use report::{render, ReportRegion, LOADING_PLACEHOLDER};
