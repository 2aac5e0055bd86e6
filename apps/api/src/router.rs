use axum::{
    Router,
    routing::get,
};

use assessment_cell::router::assessment_routes;

pub fn create_router() -> Router {
    Router::new()
        .route("/", get(|| async { "TheraPH portal API is running!" }))
        .nest("/pre-assessment", assessment_routes())
}
