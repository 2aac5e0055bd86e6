pub mod client;
pub mod local;

pub use client::PortalApiClient;
pub use local::LocalStore;
