//! Prompts sent to the vision providers.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the schema contract or the
//!    extraction instructions happens in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    calling a real model, so prompt regressions are easy to catch.

/// The JSON shape the model must emit. Embedded verbatim into both the
/// OpenAI system prompt and the Groq formatting prompt so the two providers
/// are held to the same contract.
pub const RESPONSE_SCHEMA: &str = r#"{
  "documentType": "string, e.g. 'Comprehensive Blood Panel'",
  "date": "string, ISO date from the document, e.g. '2023-10-15'",
  "summary": "string, plain-language overview",
  "findings": [
    {
      "name": "string, e.g. 'Total Cholesterol'",
      "value": "string, e.g. '215'",
      "unit": "string, e.g. 'mg/dL'",
      "referenceRange": "string, e.g. '125-200 mg/dL'",
      "status": "one of exactly: normal, abnormal, critical",
      "explanation": "string, plain-language explanation"
    }
  ],
  "terms": [
    { "term": "string", "definition": "string" }
  ],
  "recommendations": ["string"]
}"#;

/// System prompt for the single-shot OpenAI request.
///
/// One call must both read the image and emit machine-parseable structure,
/// so the schema contract is front-loaded here.
pub const OPENAI_SYSTEM_PROMPT: &str = r#"You are a medical expert that analyzes medical documents. Extract all relevant information from the image including test names, values, reference ranges, and provide explanations in plain language.

Respond with ONLY a JSON object matching this exact schema, with no surrounding prose and no markdown fences:

{schema}

Every finding's "status" must be exactly one of: normal, abnormal, critical. Do not invent findings that are not on the document."#;

/// User text accompanying the image in the OpenAI request.
pub const OPENAI_USER_PROMPT: &str =
    "Analyze this medical document and extract key information:";

/// Phase-1 (extraction) prompt for the Groq two-phase pipeline.
///
/// Vision models under varied document layouts are unreliable at emitting
/// strict JSON in the same pass that reads the image, so this phase only
/// asks for a thorough structured extraction; phase 2 handles formatting.
pub const GROQ_EXTRACTION_PROMPT: &str = r#"Analyze this medical document and extract all key findings, vital signs, and any other relevant medical information in a structured format. For each finding, include:
- Name of the finding (e.g., Heart Rate, Blood Pressure, etc.)
- Value (e.g., 72 bpm)
- Unit (e.g., bpm)
- Reference Range (if available)
- Status (normal, abnormal, or critical)
- Explanation in plain language

Also extract:
- The document type and date
- A plain-language summary of the whole document
- Definitions of medical terms a layperson would not know
- Any recommendations that follow from the results"#;

/// Render the OpenAI system prompt with the schema substituted in.
pub fn openai_system_prompt() -> String {
    OPENAI_SYSTEM_PROMPT.replace("{schema}", RESPONSE_SCHEMA)
}

/// Build the phase-2 (formatting) prompt from the phase-1 extraction text.
///
/// Sent as a text-only request at temperature 0: the extraction already
/// happened, this call only reshapes it.
pub fn format_instruction(extracted: &str) -> String {
    format!(
        "Reformat the following medical document analysis into a single JSON object \
matching this exact schema. Output ONLY the JSON object, with no surrounding prose \
and no markdown fences. Every finding's \"status\" must be exactly one of: normal, \
abnormal, critical. Do not add information that is not in the analysis.\n\n\
Schema:\n{RESPONSE_SCHEMA}\n\nAnalysis:\n\"\"\"\n{extracted}\n\"\"\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_prompt_embeds_schema() {
        let p = openai_system_prompt();
        assert!(p.contains("\"documentType\""));
        assert!(p.contains("normal, abnormal, critical"));
        assert!(!p.contains("{schema}"));
    }

    #[test]
    fn format_instruction_embeds_extraction_and_schema() {
        let p = format_instruction("LDL 130 mg/dL, above range");
        assert!(p.contains("LDL 130 mg/dL"));
        assert!(p.contains("\"referenceRange\""));
        assert!(p.contains("ONLY the JSON object"));
    }

    #[test]
    fn extraction_prompt_enumerates_required_fields() {
        for field in ["Name", "Value", "Unit", "Reference Range", "Status", "Explanation"] {
            assert!(
                GROQ_EXTRACTION_PROMPT.contains(field),
                "extraction prompt must ask for {field}"
            );
        }
    }
}
