use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;

pub fn assessment_routes() -> Router {
    Router::new()
        .route("/", get(handlers::assessment_info))
        .route("/score", post(handlers::score_assessment))
        .route("/export", post(handlers::export_assessment))
        .route("/import", post(handlers::import_assessment))
}
