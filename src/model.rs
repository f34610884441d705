//! The canonical analysis schema.
//!
//! [`AnalysisData`] is the one shape this library guarantees to its callers
//! regardless of which hosted provider produced the underlying answer. It is
//! constructed exactly once per analysis, by the normalizer, and is immutable
//! afterwards — nothing in this crate persists it or mutates it in place.
//!
//! Wire names are camelCase because that is what the providers are prompted
//! to emit; Rust field names stay snake_case via serde renames. Every field
//! is required: a provider that omits one produces a deserialization error,
//! never a silently-defaulted value.

use serde::{Deserialize, Serialize};

/// Structured result of analyzing one medical document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    /// Free-text document label, e.g. "Comprehensive Blood Panel".
    pub document_type: String,
    /// ISO-like date string as it appears on the document; not validated.
    pub date: String,
    /// Plain-language overview of the whole document.
    pub summary: String,
    /// Individual test results, in presentation order.
    pub findings: Vec<Finding>,
    /// Medical terms worth defining for the reader, in presentation order.
    pub terms: Vec<Term>,
    /// Plain-language recommendations, in presentation order.
    pub recommendations: Vec<String>,
}

/// One extracted test result or vital sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub reference_range: String,
    pub status: FindingStatus,
    pub explanation: String,
}

/// Classification of a finding against its reference range.
///
/// The three literals are a contract with the provider prompt; any other
/// wire value fails deserialization and surfaces as a malformed analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Normal,
    Abnormal,
    Critical,
}

impl FindingStatus {
    /// Uppercase tag used in rendered reports, e.g. `[ABNORMAL]`.
    pub fn tag(&self) -> &'static str {
        match self {
            FindingStatus::Normal => "NORMAL",
            FindingStatus::Abnormal => "ABNORMAL",
            FindingStatus::Critical => "CRITICAL",
        }
    }
}

/// A medical term with its plain-language definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term: String,
    pub definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_document() {
        let json = r#"{
            "documentType": "Lipid Panel",
            "date": "2024-01-01",
            "summary": "Mostly normal.",
            "findings": [{
                "name": "LDL",
                "value": "130",
                "unit": "mg/dL",
                "referenceRange": "<100 mg/dL",
                "status": "abnormal",
                "explanation": "Above the optimal range."
            }],
            "terms": [{"term": "LDL", "definition": "Low-density lipoprotein."}],
            "recommendations": ["See a doctor"]
        }"#;

        let data: AnalysisData = serde_json::from_str(json).expect("valid schema");
        assert_eq!(data.document_type, "Lipid Panel");
        assert_eq!(data.findings.len(), 1);
        assert_eq!(data.findings[0].status, FindingStatus::Abnormal);
        assert_eq!(data.findings[0].reference_range, "<100 mg/dL");
        assert_eq!(data.recommendations, vec!["See a doctor".to_string()]);
    }

    #[test]
    fn status_outside_enum_is_rejected() {
        let json = r#"{"name":"HR","value":"72","unit":"bpm",
            "referenceRange":"60-100","status":"elevated","explanation":"x"}"#;
        let result: Result<Finding, _> = serde_json::from_str(json);
        assert!(result.is_err(), "'elevated' is not a valid status");
    }

    #[test]
    fn missing_required_field_is_rejected() {
        // No "summary" field — must fail, not default to empty.
        let json = r#"{
            "documentType": "X", "date": "2024-01-01",
            "findings": [], "terms": [], "recommendations": []
        }"#;
        let result: Result<AnalysisData, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn serialization_round_trips_with_camel_case_names() {
        let data = AnalysisData {
            document_type: "ECG".into(),
            date: "2023-10-15".into(),
            summary: "Normal sinus rhythm.".into(),
            findings: vec![],
            terms: vec![],
            recommendations: vec![],
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"documentType\""));
        let back: AnalysisData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn status_tags() {
        assert_eq!(FindingStatus::Normal.tag(), "NORMAL");
        assert_eq!(FindingStatus::Critical.tag(), "CRITICAL");
    }
}
