use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::decode::DecodeSource;

pub const QUESTION_COUNT: u8 = 15;
pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;

/// Fixed question bank, indexed by `id - 1`.
pub const QUESTIONS: [&str; QUESTION_COUNT as usize] = [
    "How often do you feel nervous, anxious, or on edge?",
    "How often are you unable to stop or control worrying?",
    "How often do you feel down, depressed, or hopeless?",
    "How often do you have little interest or pleasure in doing things?",
    "How often do you have trouble falling or staying asleep?",
    "How often do you feel tired or have little energy?",
    "How often do you have a poor appetite or find yourself overeating?",
    "How often do you feel bad about yourself or feel you have let others down?",
    "How often do you have trouble concentrating on everyday tasks?",
    "How often do you feel irritable or easily annoyed?",
    "How often do you feel overwhelmed by your responsibilities?",
    "How often do you avoid contact with friends or family?",
    "How often do you feel restless or find it hard to sit still?",
    "How often do you feel that things are out of your control?",
    "How often do you have thoughts that you would be better off not being here?",
];

pub fn question_text(id: u8) -> Option<&'static str> {
    id.checked_sub(1).and_then(|index| QUESTIONS.get(index as usize)).copied()
}

/// Likert label for an answer value.
pub fn answer_label(value: u8) -> Option<&'static str> {
    match value {
        1 => Some("Never"),
        2 => Some("Rarely"),
        3 => Some("Sometimes"),
        4 => Some("Often"),
        5 => Some("Always"),
        _ => None,
    }
}

/// Question id to Likert value. JSON keys are the ids as strings.
pub type AnswerSet = BTreeMap<u8, u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBand {
    Low,
    Mild,
    Moderate,
    High,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 4] = [
        SeverityBand::Low,
        SeverityBand::Mild,
        SeverityBand::Moderate,
        SeverityBand::High,
    ];

    pub fn for_percentage(percentage: u8) -> Self {
        match percentage {
            0..=40 => SeverityBand::Low,
            41..=60 => SeverityBand::Mild,
            61..=80 => SeverityBand::Moderate,
            _ => SeverityBand::High,
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            SeverityBand::Low => "0–40%",
            SeverityBand::Mild => "41–60%",
            SeverityBand::Moderate => "61–80%",
            SeverityBand::High => "81–100%",
        }
    }

    pub fn severity_label(self) -> &'static str {
        match self {
            SeverityBand::Low => "Low likelihood",
            SeverityBand::Mild => "Mild likelihood",
            SeverityBand::Moderate => "Moderate likelihood",
            SeverityBand::High => "High likelihood",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SeverityBand::Low => {
                "Your responses suggest you are currently stable and coping well. Keep up the routines that support your wellbeing."
            }
            SeverityBand::Mild => {
                "Your responses show some emerging signs of distress. Consider talking to someone you trust and keep track of how you feel."
            }
            SeverityBand::Moderate => {
                "Your responses indicate noticeable strain. We recommend speaking with a mental health professional."
            }
            SeverityBand::High => {
                "Your responses indicate significant distress. Please seek help from a mental health professional as soon as possible."
            }
        }
    }

    /// Band whose severity label starts with `word` (`"mild"`, `"High"`, ...).
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| {
            band.severity_label()
                .split_whitespace()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(word))
        })
    }

    pub fn interpretation(self) -> Interpretation {
        Interpretation {
            range: self.range_label().to_string(),
            severity: self.severity_label().to_string(),
            message: self.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub range: String,
    pub severity: String,
    pub message: String,
}

/// The active pre-assessment, as cached locally and mirrored to the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub answers: AnswerSet,
    pub percentage: u8,
    pub interpretation: Interpretation,
    pub created_at: DateTime<Utc>,
    pub version: String,
}

// Machine-readable payload carried inside exported reports

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    pub result: EmbeddedResult,
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedResult {
    pub percentage: serde_json::Number,
    #[serde(default)]
    pub interpretation: Option<Interpretation>,
}

// HTTP request/response bodies

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub answers: AnswerSet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub record: AssessmentRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub file_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub record: AssessmentRecord,
    pub source: DecodeSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct MirrorAssessmentRequest<'a> {
    pub email: &'a str,
    pub data: &'a AssessmentRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[serde(rename = "preAssessment", default)]
    pub pre_assessment: Option<AssessmentRecord>,
}
