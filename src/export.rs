//! PDF export of a rendered report region.
//!
//! The exporter is a thin layout pass over the plain-text renderer: it
//! resolves the region id, renders the text, and lays the lines out on
//! paginated A4 pages with `printpdf` builtin fonts. The document title is
//! `Medical Report - {document_type}`; the attribution line names the
//! producing application since `printpdf` exposes no author metadata field
//! on the builder.

use crate::error::HealthLensError;
use crate::model::AnalysisData;
use crate::report::{render, ReportRegion};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(20.0);
const MARGIN_TOP: Mm = Mm(280.0);
const MARGIN_BOTTOM: Mm = Mm(20.0);
const LINE_STEP: Mm = Mm(5.0);
const WRAP_COLUMNS: usize = 90;

const ATTRIBUTION: &str = "Generated by HealthLens AI";

/// Render a region of the analysis and write it as a PDF into `out_dir`.
///
/// The file is named `medical-report-<unix-millis>.pdf`. An unknown region
/// id fails with [`HealthLensError::RenderTargetNotFound`] before anything
/// is written.
pub fn generate_document(
    data: &AnalysisData,
    region_id: &str,
    out_dir: impl AsRef<Path>,
) -> Result<PathBuf, HealthLensError> {
    let region = ReportRegion::from_id(region_id).ok_or_else(|| {
        HealthLensError::RenderTargetNotFound {
            region: region_id.to_string(),
        }
    })?;

    let bytes = build_pdf(data, region)?;

    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|e| HealthLensError::Export {
        detail: format!("creating '{}': {e}", out_dir.display()),
    })?;

    let path = out_dir.join(format!(
        "medical-report-{}.pdf",
        chrono::Utc::now().timestamp_millis()
    ));
    fs::write(&path, &bytes).map_err(|e| HealthLensError::Export {
        detail: format!("writing '{}': {e}", path.display()),
    })?;

    info!(bytes = bytes.len(), "PDF exported: {}", path.display());
    Ok(path)
}

/// Lay the rendered region out as PDF bytes.
fn build_pdf(data: &AnalysisData, region: ReportRegion) -> Result<Vec<u8>, HealthLensError> {
    let title = format!("Medical Report - {}", data.document_type);
    let (doc, page1, layer1) = PdfDocument::new(&title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| HealthLensError::Export { detail: e.to_string() })?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| HealthLensError::Export { detail: e.to_string() })?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: MARGIN_TOP,
    };

    writer.line(&title, 14.0, &bold);
    writer.line(&format!("Date: {}", data.date), 9.0, &font);
    writer.line(ATTRIBUTION, 8.0, &font);
    writer.skip(Mm(4.0));

    // The title block above replaces the text renderer's own header, so the
    // full report is composed from its section regions.
    let sections = match region {
        ReportRegion::FullReport => vec![
            ReportRegion::Summary,
            ReportRegion::Findings,
            ReportRegion::Terms,
            ReportRegion::Recommendations,
        ],
        other => vec![other],
    };

    for section in sections {
        for raw_line in render(data, section).lines() {
            if raw_line.is_empty() {
                writer.skip(Mm(2.0));
                continue;
            }
            if raw_line.starts_with('-') && raw_line.chars().all(|c| c == '-') {
                continue; // underline rows exist only for the text rendering
            }
            let is_heading = matches!(
                raw_line,
                "Summary" | "Findings" | "Medical Terms" | "Recommendations"
            );
            let (size, face) = if is_heading { (11.0, &bold) } else { (9.0, &font) };
            for wrapped in wrap_text(raw_line, WRAP_COLUMNS) {
                writer.line(&wrapped, size, face);
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| HealthLensError::Export { detail: format!("PDF save: {e}") })?;
    buf.into_inner()
        .map_err(|e| HealthLensError::Export { detail: format!("PDF buffer: {e}") })
}

/// Cursor-based writer that starts a fresh A4 page when the column is full.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size: f32, face: &IndirectFontRef) {
        if self.y < MARGIN_BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN_TOP;
        }
        self.layer.use_text(text, size, MARGIN_LEFT, self.y, face);
        self.y -= LINE_STEP;
    }

    fn skip(&mut self, amount: Mm) {
        self.y -= amount;
    }
}

/// Word-wrap a line to at most `max_chars` columns.
///
/// Columns are counted in characters, not bytes, so units like `µmol/L`
/// and `°C` do not wrap early.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_cols = 0;

    for word in text.split_whitespace() {
        let word_cols = word.chars().count();
        if current_cols + word_cols + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_cols = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_cols += 1;
        }
        current.push_str(word);
        current_cols += word_cols;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, FindingStatus};

    fn sample() -> AnalysisData {
        AnalysisData {
            document_type: "Blood Test Results".into(),
            date: "2024-03-15".into(),
            summary: "Mostly normal values.".into(),
            findings: vec![Finding {
                name: "Hemoglobin".into(),
                value: "14.2".into(),
                unit: "g/dL".into(),
                reference_range: "13.5-17.5".into(),
                status: FindingStatus::Normal,
                explanation: "Within the expected range.".into(),
            }],
            terms: vec![],
            recommendations: vec!["Routine follow-up in 12 months.".into()],
        }
    }

    #[test]
    fn exports_a_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_document(&sample(), "full-report", dir.path()).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("medical-report-") && name.ends_with(".pdf"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "output must be a PDF");

        // Document metadata must carry the title naming the document type.
        let title = b"Medical Report - Blood Test Results";
        assert!(
            bytes.windows(title.len()).any(|w| w == &title[..]),
            "PDF metadata must contain the report title"
        );
    }

    #[test]
    fn unknown_region_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_document(&sample(), "sidebar", dir.path()).unwrap_err();
        assert!(matches!(err, HealthLensError::RenderTargetNotFound { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn long_reports_paginate() {
        let mut data = sample();
        for i in 0..120 {
            data.findings.push(Finding {
                name: format!("Marker {i}"),
                value: "1".into(),
                unit: "U".into(),
                reference_range: "0-2".into(),
                status: FindingStatus::Normal,
                explanation: "Stable.".into(),
            });
        }
        let dir = tempfile::tempdir().unwrap();
        let path = generate_document(&data, "findings", dir.path()).unwrap();
        // Multi-page documents carry more than one /Page object.
        let bytes = fs::read(&path).unwrap();
        let pages = bytes.windows(5).filter(|w| w == b"/Page").count();
        assert!(pages > 1);
    }

    #[test]
    fn wrap_respects_the_column_limit() {
        let wrapped = wrap_text("alpha beta gamma delta epsilon", 11);
        assert_eq!(wrapped, vec!["alpha beta", "gamma delta", "epsilon"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        // Five two-byte chars per word: 11 columns fit on one line.
        assert_eq!(wrap_text("µµµµµ µµµµµ", 11), vec!["µµµµµ µµµµµ"]);
        assert_eq!(
            wrap_text("Temp 37.1 °C within range", 13),
            vec!["Temp 37.1 °C", "within range"]
        );
    }
}
