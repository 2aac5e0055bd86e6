pub mod doctor;
pub mod editor;
pub mod store;

pub use doctor::DoctorDirectory;
pub use editor::AvailabilityEditor;
pub use store::{AvailabilityStore, HttpAvailabilityStore};
