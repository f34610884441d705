//! Plain-text report rendering.
//!
//! The renderer is a pure function over [`AnalysisData`]: same input, same
//! text, byte for byte. Regions let callers render a single section — the
//! PDF exporter resolves its target by region id, and the CLI prints the
//! full report by default.

use crate::model::{AnalysisData, FindingStatus};
use std::fmt::Write as _;

/// Text shown while an analysis is in flight.
pub const LOADING_PLACEHOLDER: &str = "Analyzing document...";

/// A renderable section of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRegion {
    FullReport,
    Summary,
    Findings,
    Terms,
    Recommendations,
}

impl ReportRegion {
    /// Resolve a region from its stable string id.
    ///
    /// Returns `None` for an unknown id; callers decide whether that is an
    /// error (the exporter treats it as one).
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "full-report" => Some(Self::FullReport),
            "summary" => Some(Self::Summary),
            "findings" => Some(Self::Findings),
            "terms" => Some(Self::Terms),
            "recommendations" => Some(Self::Recommendations),
            _ => None,
        }
    }

    /// The stable string id for this region.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FullReport => "full-report",
            Self::Summary => "summary",
            Self::Findings => "findings",
            Self::Terms => "terms",
            Self::Recommendations => "recommendations",
        }
    }
}

/// Render a region of the analysis as deterministic plain text.
pub fn render(data: &AnalysisData, region: ReportRegion) -> String {
    let mut out = String::new();
    match region {
        ReportRegion::FullReport => {
            render_header(&mut out, data);
            render_summary(&mut out, data);
            render_findings(&mut out, data);
            render_terms(&mut out, data);
            render_recommendations(&mut out, data);
        }
        ReportRegion::Summary => render_summary(&mut out, data),
        ReportRegion::Findings => render_findings(&mut out, data),
        ReportRegion::Terms => render_terms(&mut out, data),
        ReportRegion::Recommendations => render_recommendations(&mut out, data),
    }
    out
}

fn render_header(out: &mut String, data: &AnalysisData) {
    let _ = writeln!(out, "Medical Report - {}", data.document_type);
    let _ = writeln!(out, "Date: {}", data.date);
    out.push('\n');
}

fn render_summary(out: &mut String, data: &AnalysisData) {
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "-------");
    let _ = writeln!(out, "{}", data.summary);
    out.push('\n');
}

/// One card per finding, in the order the provider returned them.
fn render_findings(out: &mut String, data: &AnalysisData) {
    let _ = writeln!(out, "Findings");
    let _ = writeln!(out, "--------");
    if data.findings.is_empty() {
        let _ = writeln!(out, "No findings reported.");
    }
    for finding in &data.findings {
        let _ = writeln!(out, "[{}] {}", finding.status.tag(), finding.name);
        let _ = writeln!(out, "  Value: {} {}", finding.value, finding.unit);
        let _ = writeln!(out, "  Reference range: {}", finding.reference_range);
        let _ = writeln!(out, "  {}", finding.explanation);
        out.push('\n');
    }
}

fn render_terms(out: &mut String, data: &AnalysisData) {
    let _ = writeln!(out, "Medical Terms");
    let _ = writeln!(out, "-------------");
    if data.terms.is_empty() {
        let _ = writeln!(out, "No terms explained.");
    }
    for term in &data.terms {
        let _ = writeln!(out, "{}: {}", term.term, term.definition);
    }
    out.push('\n');
}

fn render_recommendations(out: &mut String, data: &AnalysisData) {
    let _ = writeln!(out, "Recommendations");
    let _ = writeln!(out, "---------------");
    if data.recommendations.is_empty() {
        let _ = writeln!(out, "No recommendations.");
    }
    for rec in &data.recommendations {
        let _ = writeln!(out, "- {rec}");
    }
}

/// Count findings per status, for the CLI summary line.
pub fn status_counts(data: &AnalysisData) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for f in &data.findings {
        match f.status {
            FindingStatus::Normal => counts.0 += 1,
            FindingStatus::Abnormal => counts.1 += 1,
            FindingStatus::Critical => counts.2 += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, Term};

    fn sample() -> AnalysisData {
        AnalysisData {
            document_type: "Blood Test Results".into(),
            date: "2024-03-15".into(),
            summary: "Overall values within range except LDL.".into(),
            findings: vec![Finding {
                name: "LDL Cholesterol".into(),
                value: "132".into(),
                unit: "mg/dL".into(),
                reference_range: "<100".into(),
                status: FindingStatus::Abnormal,
                explanation: "Above the optimal range.".into(),
            }],
            terms: vec![Term {
                term: "LDL".into(),
                definition: "Low-density lipoprotein, often called bad cholesterol.".into(),
            }],
            recommendations: vec!["Discuss cholesterol management with your doctor.".into()],
        }
    }

    #[test]
    fn abnormal_finding_renders_as_tagged_card() {
        let text = render(&sample(), ReportRegion::FullReport);
        assert!(text.contains("Medical Report - Blood Test Results"));
        assert!(text.contains("[ABNORMAL] LDL Cholesterol"));
        assert!(text.contains("Value: 132 mg/dL"));
        assert!(text.contains("Reference range: <100"));
        assert!(text.contains("- Discuss cholesterol management with your doctor."));
    }

    #[test]
    fn rendering_is_deterministic() {
        let data = sample();
        assert_eq!(
            render(&data, ReportRegion::FullReport),
            render(&data, ReportRegion::FullReport)
        );
    }

    #[test]
    fn regions_render_only_their_section() {
        let data = sample();
        let summary = render(&data, ReportRegion::Summary);
        assert!(summary.contains("Overall values within range"));
        assert!(!summary.contains("[ABNORMAL]"));
        assert!(!summary.contains("Medical Report -"));

        let recs = render(&data, ReportRegion::Recommendations);
        assert!(recs.starts_with("Recommendations"));
        assert!(!recs.contains("Summary"));
    }

    #[test]
    fn empty_sections_have_placeholders() {
        let mut data = sample();
        data.findings.clear();
        data.terms.clear();
        data.recommendations.clear();
        let text = render(&data, ReportRegion::FullReport);
        assert!(text.contains("No findings reported."));
        assert!(text.contains("No terms explained."));
        assert!(text.contains("No recommendations."));
    }

    #[test]
    fn region_ids_round_trip() {
        for region in [
            ReportRegion::FullReport,
            ReportRegion::Summary,
            ReportRegion::Findings,
            ReportRegion::Terms,
            ReportRegion::Recommendations,
        ] {
            assert_eq!(ReportRegion::from_id(region.id()), Some(region));
        }
        assert_eq!(ReportRegion::from_id("sidebar"), None);
    }

    #[test]
    fn status_counts_tally_by_status() {
        let mut data = sample();
        data.findings.push(Finding {
            status: FindingStatus::Normal,
            ..data.findings[0].clone()
        });
        assert_eq!(status_counts(&data), (1, 1, 0));
    }
}
