use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use tracing::debug;

use shared_models::error::PortalError;

use crate::models::{
    answer_label, question_text, AssessmentRecord, EmbeddedPayload, EmbeddedResult,
};

pub const EMBEDDED_DATA_START: &str = "EMBEDDED_DATA_START";
pub const EMBEDDED_DATA_END: &str = "EMBEDDED_DATA_END";
pub const PAYLOAD_TYPE: &str = "theraPH_pre_assessment";
pub const REPORT_TITLE: &str = "TheraPH Pre-Assessment Report";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM: Mm = Mm(20.0);
const LEFT_COLUMN: Mm = Mm(20.0);
const RIGHT_COLUMN: Mm = Mm(110.0);
const LINE_HEIGHT: f32 = 4.5;
const COLUMN_CHARS: usize = 44;
const BODY_CHARS: usize = 90;
const PAYLOAD_FONT_SIZE: f32 = 1.0;

fn pdf_error(stage: &str, e: impl std::fmt::Display) -> PortalError {
    PortalError::Render(format!("PDF {} failed: {}", stage, e))
}

/// The single-line JSON carried between the sentinels.
///
/// Non-ASCII characters are written as `\uXXXX` escapes so the payload
/// survives the report font's single-byte encoding.
pub fn embedded_payload_json(record: &AssessmentRecord) -> Result<String, PortalError> {
    let payload = EmbeddedPayload {
        kind: PAYLOAD_TYPE.to_string(),
        version: Some(record.version.clone()),
        created_at: Some(record.created_at),
        result: EmbeddedResult {
            percentage: serde_json::Number::from(record.percentage),
            interpretation: Some(record.interpretation.clone()),
        },
        answers: record.answers.clone(),
    };

    let json = serde_json::to_string(&payload)
        .map_err(|e| PortalError::validation(format!("Could not serialize assessment: {}", e)))?;
    Ok(escape_non_ascii(&json))
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// ASCII rendition of visible text for the built-in Helvetica font.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '–' | '—' => '-',
            '‘' | '’' => '\'',
            '“' | '”' => '"',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self, PortalError> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_error("font", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_error("font", e))?;

        Ok(Self { doc, layer, font, bold, y: TOP })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y.0 - height < BOTTOM.0 {
            self.new_page();
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_room(LINE_HEIGHT);
        let font = if bold { &self.bold } else { &self.font };
        self.layer.use_text(printable(text), size, LEFT_COLUMN, self.y, font);
        self.y -= Mm(LINE_HEIGHT + size * 0.15);
    }

    fn paragraph(&mut self, text: &str, size: f32) {
        for line in wrap_text(text, BODY_CHARS) {
            self.line(&line, size, false);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= Mm(height);
    }

    /// Two question blocks side by side; the left block is written first.
    fn question_row(&mut self, left: &[String], right: &[String]) {
        let rows = left.len().max(right.len());
        self.ensure_room(rows as f32 * LINE_HEIGHT);

        let top = self.y;
        for (column, block) in [(LEFT_COLUMN, left), (RIGHT_COLUMN, right)] {
            let mut y = top;
            for line in block {
                self.layer.use_text(printable(line), 9.0, column, y, &self.font);
                y -= Mm(LINE_HEIGHT);
            }
        }
        self.y = Mm(top.0 - rows as f32 * LINE_HEIGHT - 3.0);
    }

    /// Sentinels and payload on a trailing page, 1pt white text.
    fn hidden_payload(&mut self, payload: &str) {
        self.new_page();
        self.layer.set_fill_color(Color::Greyscale(Greyscale::new(1.0, None)));
        for text in [EMBEDDED_DATA_START, payload, EMBEDDED_DATA_END] {
            self.layer.use_text(text, PAYLOAD_FONT_SIZE, LEFT_COLUMN, self.y, &self.font);
            self.y -= Mm(4.0);
        }
    }

    fn finish(self) -> Result<Vec<u8>, PortalError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(|e| pdf_error("save", e))?;
        buf.into_inner().map_err(|e| pdf_error("buffer", e))
    }
}

fn question_block(id: u8, value: u8) -> Vec<String> {
    let question = question_text(id).unwrap_or("Unknown question");
    let mut block = wrap_text(&format!("Q{}. {}", id, question), COLUMN_CHARS);
    let label = answer_label(value).unwrap_or("Unanswered");
    block.push(format!("Answer: {} - {}", value, label));
    block
}

/// Render the visible report plus the embedded payload page.
pub fn render_pdf(record: &AssessmentRecord) -> Result<Vec<u8>, PortalError> {
    let payload = embedded_payload_json(record)?;
    let mut writer = ReportWriter::new(REPORT_TITLE)?;

    writer.line(REPORT_TITLE, 16.0, true);
    writer.gap(2.0);
    writer.line(&format!("Date: {}", record.created_at.format("%Y-%m-%d")), 10.0, false);
    writer.gap(2.0);
    writer.line(
        &format!(
            "Assessment Score: {}% ({})",
            record.percentage, record.interpretation.range
        ),
        12.0,
        true,
    );
    writer.line(&format!("Severity: {}", record.interpretation.severity), 11.0, false);
    writer.paragraph(&format!("Interpretation: {}", record.interpretation.message), 10.0);
    writer.gap(4.0);
    writer.line("Responses", 11.0, true);
    writer.gap(1.0);

    let blocks: Vec<Vec<String>> = record
        .answers
        .iter()
        .map(|(id, value)| question_block(*id, *value))
        .collect();
    for pair in blocks.chunks(2) {
        let right = pair.get(1).map(Vec::as_slice).unwrap_or(&[]);
        writer.question_row(&pair[0], right);
    }

    writer.hidden_payload(&payload);

    debug!(
        "Rendered pre-assessment report ({} answers, score {})",
        record.answers.len(),
        record.percentage
    );
    writer.finish()
}
