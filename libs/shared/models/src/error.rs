use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PortalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot modify availability for a past date ({0})")]
    PastDate(NaiveDate),

    #[error("Store rejected the request: {0}")]
    StoreRejection(String),

    #[error("Could not reach the store: {0}")]
    Transport(String),

    #[error("Could not read the uploaded report: {0}")]
    Decode(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Could not render the report: {0}")]
    Render(String),
}

impl PortalError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PortalError::Validation(msg.into())
    }

    /// Errors raised before any store call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(self, PortalError::Validation(_) | PortalError::PastDate(_))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Decode(err.to_string())
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match &self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::PastDate(_) => StatusCode::CONFLICT,
            PortalError::StoreRejection(_) => StatusCode::BAD_GATEWAY,
            PortalError::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
            PortalError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::Storage(_) | PortalError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
