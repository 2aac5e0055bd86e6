pub mod decode;
pub mod pdf;
pub mod repository;
pub mod scoring;

pub use decode::{AssessmentDecoder, DecodeSource, DecodedAssessment, PdfTextExtractor, TextExtractor};
pub use repository::{AssessmentRepository, ReconcileOutcome, RemoteSync};
