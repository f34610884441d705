//! Result normalization: provider-shaped response → [`AnalysisData`].
//!
//! The two providers wrap their payload differently — the Groq client hands
//! back a chat-completion envelope whose content must be unwrapped, while
//! the OpenAI client already plucked the content string — so normalization
//! pattern-matches on the [`RawProviderResponse`] tag before parsing.
//!
//! The parse itself is deliberately strict. A missing field, an unknown
//! `status` literal, or malformed JSON is a hard `MalformedAnalysis` error:
//! this pipeline never substitutes defaults or sample findings for medical
//! data it did not actually receive. The only leniency is stripping a
//! surrounding markdown fence, because models wrap JSON in ```` ```json ````
//! fences no matter how firmly the prompt forbids it.

use crate::error::HealthLensError;
use crate::model::AnalysisData;
use crate::pipeline::provider::RawProviderResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Convert a raw provider response into the canonical schema.
pub fn normalize(raw: RawProviderResponse) -> Result<AnalysisData, HealthLensError> {
    let provider = raw.provider().name();

    let payload = match raw {
        RawProviderResponse::OpenAi(content) => content,
        RawProviderResponse::Groq(envelope) => envelope
            .ok_or(HealthLensError::EmptyResponse { provider: "groq" })?
            .content()
            .map(str::to_string),
    };

    let text = match payload {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(HealthLensError::EmptyResponse { provider }),
    };

    parse_analysis(&text, provider)
}

/// Parse a JSON (possibly fence-wrapped) payload into [`AnalysisData`].
fn parse_analysis(text: &str, provider: &'static str) -> Result<AnalysisData, HealthLensError> {
    let body = strip_json_fences(text);
    debug!(provider, bytes = body.len(), "Parsing analysis payload");

    serde_json::from_str::<AnalysisData>(body).map_err(|e| HealthLensError::MalformedAnalysis {
        detail: e.to_string(),
    })
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

/// Strip an outer ``` / ```json fence if the payload is wrapped in one.
fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FindingStatus;
    use crate::pipeline::provider::ChatCompletion;

    const VALID_JSON: &str = r#"{
        "documentType": "Lipid Panel",
        "date": "2024-01-01",
        "summary": "Cholesterol slightly elevated.",
        "findings": [
            {"name": "LDL", "value": "130", "unit": "mg/dL",
             "referenceRange": "<100", "status": "abnormal",
             "explanation": "Above the optimal range."},
            {"name": "HDL", "value": "62", "unit": "mg/dL",
             "referenceRange": ">40", "status": "normal",
             "explanation": "Healthy level."}
        ],
        "terms": [],
        "recommendations": ["See a doctor"]
    }"#;

    fn groq_envelope(content: &str) -> RawProviderResponse {
        let envelope: ChatCompletion = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": content}}]
        }))
        .unwrap();
        RawProviderResponse::Groq(Some(envelope))
    }

    #[test]
    fn openai_content_parses_directly() {
        let data = normalize(RawProviderResponse::OpenAi(Some(VALID_JSON.into()))).unwrap();
        assert_eq!(data.document_type, "Lipid Panel");
        // Finding order must be preserved exactly as parsed.
        assert_eq!(data.findings[0].name, "LDL");
        assert_eq!(data.findings[0].status, FindingStatus::Abnormal);
        assert_eq!(data.findings[1].name, "HDL");
        assert_eq!(data.recommendations, vec!["See a doctor".to_string()]);
    }

    #[test]
    fn groq_envelope_is_unwrapped_before_parsing() {
        let data = normalize(groq_envelope(VALID_JSON)).unwrap();
        assert_eq!(data.findings.len(), 2);
        assert_eq!(data.summary, "Cholesterol slightly elevated.");
    }

    #[test]
    fn fenced_json_is_accepted() {
        let fenced = format!("```json\n{VALID_JSON}\n```");
        let data = normalize(RawProviderResponse::OpenAi(Some(fenced))).unwrap();
        assert_eq!(data.document_type, "Lipid Panel");

        let bare_fence = format!("```\n{VALID_JSON}\n```");
        assert!(normalize(RawProviderResponse::OpenAi(Some(bare_fence))).is_ok());
    }

    #[test]
    fn absent_payload_is_empty_response() {
        for raw in [
            RawProviderResponse::OpenAi(None),
            RawProviderResponse::OpenAi(Some("   ".into())),
            RawProviderResponse::Groq(None),
            groq_envelope(""),
        ] {
            let err = normalize(raw).unwrap_err();
            assert!(
                matches!(err, HealthLensError::EmptyResponse { .. }),
                "expected EmptyResponse, got: {err}"
            );
        }
    }

    #[test]
    fn empty_choices_is_empty_response() {
        let envelope: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = normalize(RawProviderResponse::Groq(Some(envelope))).unwrap_err();
        assert!(matches!(err, HealthLensError::EmptyResponse { .. }));
    }

    #[test]
    fn malformed_json_is_rejected_not_defaulted() {
        let err =
            normalize(RawProviderResponse::OpenAi(Some("The LDL looks high.".into()))).unwrap_err();
        assert!(matches!(err, HealthLensError::MalformedAnalysis { .. }));
    }

    #[test]
    fn status_outside_enum_is_malformed() {
        let bad = VALID_JSON.replace("\"abnormal\"", "\"elevated\"");
        let err = normalize(RawProviderResponse::OpenAi(Some(bad))).unwrap_err();
        match err {
            HealthLensError::MalformedAnalysis { detail } => {
                assert!(detail.contains("elevated") || detail.contains("variant"), "{detail}");
            }
            other => panic!("expected MalformedAnalysis, got: {other}"),
        }
    }

    #[test]
    fn missing_field_is_malformed() {
        let bad = VALID_JSON.replace("\"date\": \"2024-01-01\",", "");
        let err = normalize(RawProviderResponse::OpenAi(Some(bad))).unwrap_err();
        assert!(matches!(err, HealthLensError::MalformedAnalysis { .. }));
    }

    #[test]
    fn strip_fences_leaves_bare_json_alone() {
        assert_eq!(strip_json_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
