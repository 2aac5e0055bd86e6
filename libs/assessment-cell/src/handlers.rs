use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::PortalError;

use crate::models::{
    answer_label, AssessmentRecord, ExportRequest, ImportRequest, ImportResponse, ScoreRequest,
    MAX_ANSWER, MIN_ANSWER, QUESTIONS,
};
use crate::services::decode::AssessmentDecoder;
use crate::services::pdf::render_pdf;
use crate::services::scoring::build_record;

pub async fn assessment_info() -> Json<Value> {
    let questions: Vec<Value> = QUESTIONS
        .iter()
        .zip(1..)
        .map(|(text, id)| json!({ "id": id, "text": text }))
        .collect();
    let scale: Vec<Value> = (MIN_ANSWER..=MAX_ANSWER)
        .map(|value| json!({ "value": value, "label": answer_label(value) }))
        .collect();

    Json(json!({ "questions": questions, "scale": scale }))
}

pub async fn score_assessment(
    Json(request): Json<ScoreRequest>,
) -> Result<Json<AssessmentRecord>, PortalError> {
    let record = build_record(request.answers, Utc::now())?;
    debug!("Scored pre-assessment: {}", record.percentage);
    Ok(Json(record))
}

pub async fn export_assessment(
    Json(request): Json<ExportRequest>,
) -> Result<Response, PortalError> {
    let record = request.record;
    let bytes = render_pdf(&record)?;
    let filename = format!("pre-assessment-{}.pdf", record.created_at.format("%Y-%m-%d"));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Strip an optional `data:...;base64,` prefix and decode.
pub fn decode_upload(file_data: &str) -> Result<Vec<u8>, PortalError> {
    let base64_data = if file_data.contains(";base64,") {
        file_data.split(";base64,").nth(1).unwrap_or(file_data)
    } else if file_data.starts_with("data:") {
        file_data.split_once(',').map(|(_, data)| data).unwrap_or(file_data)
    } else {
        file_data
    };

    let bytes = BASE64
        .decode(base64_data.trim())
        .map_err(|e| PortalError::validation(format!("file_data is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(PortalError::validation("Uploaded file is empty"));
    }
    Ok(bytes)
}

pub async fn import_assessment(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, PortalError> {
    let bytes = decode_upload(&request.file_data)?;
    debug!("Decoding uploaded report ({} bytes)", bytes.len());

    let decoded = AssessmentDecoder::new().decode_owned(bytes, Utc::now()).await?;

    Ok(Json(ImportResponse {
        record: decoded.record,
        source: decoded.source,
    }))
}
