use chrono::{DateTime, Utc};

use shared_models::error::PortalError;

use crate::models::{
    AnswerSet, AssessmentRecord, Interpretation, SeverityBand, MAX_ANSWER, MIN_ANSWER,
    QUESTION_COUNT,
};

pub const RECORD_VERSION: &str = "1.0";

/// Every question answered exactly once with a value in `1..=5`.
pub fn validate_answers(answers: &AnswerSet) -> Result<(), PortalError> {
    if let Some(id) = answers.keys().find(|id| !(1..=QUESTION_COUNT).contains(*id)) {
        return Err(PortalError::validation(format!("Unknown question {}", id)));
    }

    let missing: Vec<String> = (1..=QUESTION_COUNT)
        .filter(|id| !answers.contains_key(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PortalError::validation(format!(
            "Please answer every question (missing: {})",
            missing.join(", ")
        )));
    }

    if let Some((id, value)) = answers
        .iter()
        .find(|(_, value)| !(MIN_ANSWER..=MAX_ANSWER).contains(*value))
    {
        return Err(PortalError::validation(format!(
            "Answer {} to question {} is outside {}..{}",
            value, id, MIN_ANSWER, MAX_ANSWER
        )));
    }

    Ok(())
}

/// `round(sum / 75 * 100)` for a complete answer set.
pub fn score(answers: &AnswerSet) -> Result<u8, PortalError> {
    validate_answers(answers)?;

    let sum: u32 = answers.values().map(|value| u32::from(*value)).sum();
    // sum * 100 / 75 == sum * 4 / 3; thirds never land on .5
    let percentage = (sum * 4 + 1) / 3;

    Ok(percentage.min(100) as u8)
}

pub fn interpret(percentage: u8) -> Interpretation {
    SeverityBand::for_percentage(percentage).interpretation()
}

pub fn build_record(
    answers: AnswerSet,
    created_at: DateTime<Utc>,
) -> Result<AssessmentRecord, PortalError> {
    let percentage = score(&answers)?;

    Ok(AssessmentRecord {
        answers,
        percentage,
        interpretation: interpret(percentage),
        created_at,
        version: RECORD_VERSION.to_string(),
    })
}
