pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AnswerSet, AssessmentRecord, Interpretation, SeverityBand};
pub use router::assessment_routes;
pub use services::*;
