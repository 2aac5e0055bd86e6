use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use shared_models::error::PortalError;

use crate::models::{
    AnswerSet, AssessmentRecord, EmbeddedPayload, Interpretation, SeverityBand, MAX_ANSWER,
    MIN_ANSWER, QUESTION_COUNT,
};
use crate::services::pdf::{EMBEDDED_DATA_END, EMBEDDED_DATA_START, PAYLOAD_TYPE};
use crate::services::scoring::RECORD_VERSION;

const MESSAGE_LIMIT: usize = 300;
const MIN_MESSAGE_LEN: usize = 10;
const DEFAULT_ANSWER: u8 = 3;

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Assessment\s+Score:?\s*(\d{1,3})\s*%").expect("valid regex")
});
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*%").expect("valid regex"));
static SEVERITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Low|Mild|Moderate|High)\s+likelihood").expect("valid regex")
});
/// Interpretation text up to the `Responses` heading or the first question.
static MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)Interpretation:?[ \t]*(.+?)(?:\n[ \t]*(?-i:Responses)[ \t]*(?:\n|\z)|\n[ \t]*Q\d{1,2}\.|\z)",
    )
    .expect("valid regex")
});
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Q(\d{1,2})\.[\s\S]*?Answer:\s*([1-5])").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeSource {
    /// Read from the sentinel-delimited JSON payload.
    Embedded,
    /// Rebuilt from visible report text; unanswered questions become 3.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAssessment {
    pub record: AssessmentRecord,
    pub source: DecodeSource,
}

/// Text layer of a PDF, one string per page in page order.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, PortalError>;
}

/// Extractor backed by the pdf-extract crate.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, PortalError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| PortalError::Decode(format!("unreadable PDF: {}", e)))
    }
}

#[derive(Clone)]
pub struct AssessmentDecoder {
    extractor: Arc<dyn TextExtractor>,
}

impl Default for AssessmentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentDecoder {
    pub fn new() -> Self {
        Self::with_extractor(Arc::new(PdfTextExtractor))
    }

    pub fn with_extractor(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Decode an uploaded report. `now` stamps records that carry no timestamp.
    pub fn decode(&self, pdf_bytes: &[u8], now: DateTime<Utc>) -> Result<DecodedAssessment, PortalError> {
        let pages = self.extractor.extract_pages(pdf_bytes)?;
        let text = pages.join("\n");

        if text.trim().is_empty() {
            return Err(PortalError::Decode("the PDF has no readable text".to_string()));
        }

        debug!("Extracted {} characters from {} page(s)", text.len(), pages.len());
        decode_text(&text, now)
    }

    /// [`decode`](Self::decode) on the blocking pool.
    pub async fn decode_owned(
        &self,
        pdf_bytes: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<DecodedAssessment, PortalError> {
        let decoder = self.clone();
        tokio::task::spawn_blocking(move || decoder.decode(&pdf_bytes, now))
            .await
            .map_err(|e| PortalError::Decode(format!("decoder task failed: {}", e)))?
    }
}

/// Embedded payload first; visible-text heuristics only when that fails.
pub fn decode_text(text: &str, now: DateTime<Utc>) -> Result<DecodedAssessment, PortalError> {
    match decode_embedded(text, now) {
        Ok(record) => Ok(DecodedAssessment {
            record,
            source: DecodeSource::Embedded,
        }),
        Err(e) => {
            warn!("Embedded assessment data unusable ({}); reading visible text", e);
            decode_heuristic(text, now).map(|record| DecodedAssessment {
                record,
                source: DecodeSource::Heuristic,
            })
        }
    }
}

fn embedded_slice(text: &str) -> Option<&str> {
    let start = text.find(EMBEDDED_DATA_START)? + EMBEDDED_DATA_START.len();
    let end = text[start..].find(EMBEDDED_DATA_END)?;
    Some(&text[start..start + end])
}

pub fn decode_embedded(text: &str, now: DateTime<Utc>) -> Result<AssessmentRecord, PortalError> {
    let slice = embedded_slice(text)
        .ok_or_else(|| PortalError::Decode("no embedded assessment data".to_string()))?;
    let json = slice.split_whitespace().collect::<Vec<_>>().join(" ");

    let payload: EmbeddedPayload = serde_json::from_str(&json)?;
    if payload.kind != PAYLOAD_TYPE {
        return Err(PortalError::Decode(format!(
            "unexpected payload type '{}'",
            payload.kind
        )));
    }

    let percentage = payload
        .result
        .percentage
        .as_f64()
        .filter(|value| (0.0..=100.0).contains(value))
        .ok_or_else(|| PortalError::Decode("embedded score is out of range".to_string()))?
        .round() as u8;

    let interpretation = payload
        .result
        .interpretation
        .unwrap_or_else(|| SeverityBand::for_percentage(percentage).interpretation());

    Ok(AssessmentRecord {
        answers: sanitize_answers(payload.answers),
        percentage,
        interpretation,
        created_at: payload.created_at.unwrap_or(now),
        version: payload.version.unwrap_or_else(|| RECORD_VERSION.to_string()),
    })
}

fn sanitize_answers(answers: AnswerSet) -> AnswerSet {
    answers
        .into_iter()
        .filter(|(id, value)| {
            (1..=QUESTION_COUNT).contains(id) && (MIN_ANSWER..=MAX_ANSWER).contains(value)
        })
        .collect()
}

fn is_report_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("pre-assessment report") || lower.contains("assessment score")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

pub fn decode_heuristic(text: &str, now: DateTime<Utc>) -> Result<AssessmentRecord, PortalError> {
    if !is_report_text(text) {
        return Err(PortalError::Decode("not a recognized report".to_string()));
    }

    let captured = SCORE_RE
        .captures(text)
        .or_else(|| PERCENT_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| PortalError::Decode("no assessment score found".to_string()))?;
    let percentage: u8 = captured
        .as_str()
        .parse()
        .ok()
        .filter(|value| *value <= 100)
        .ok_or_else(|| {
            PortalError::Decode(format!("assessment score {} is out of range", captured.as_str()))
        })?;

    let band = SeverityBand::for_percentage(percentage);
    let severity = SEVERITY_RE
        .captures(text)
        .and_then(|caps| SeverityBand::from_word(&caps[1]))
        .unwrap_or(band)
        .severity_label()
        .to_string();

    let message = MESSAGE_RE
        .captures(text)
        .map(|caps| {
            let joined = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            truncate_chars(&joined, MESSAGE_LIMIT)
        })
        .filter(|message| message.chars().count() >= MIN_MESSAGE_LEN)
        .unwrap_or_else(|| band.message().to_string());

    let mut answers: AnswerSet = (1..=QUESTION_COUNT).map(|id| (id, DEFAULT_ANSWER)).collect();
    let mut found = 0;
    for caps in ANSWER_RE.captures_iter(text) {
        let (Ok(id), Ok(value)) = (caps[1].parse::<u8>(), caps[2].parse::<u8>()) else {
            continue;
        };
        if let Some(slot) = answers.get_mut(&id) {
            *slot = value;
            found += 1;
        }
    }
    debug!("Recovered {} of {} answers from report text", found, QUESTION_COUNT);

    Ok(AssessmentRecord {
        answers,
        percentage,
        interpretation: Interpretation {
            range: band.range_label().to_string(),
            severity,
            message,
        },
        created_at: now,
        version: RECORD_VERSION.to_string(),
    })
}
