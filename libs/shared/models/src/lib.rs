pub mod error;
pub mod notice;

pub use error::PortalError;
pub use notice::{Notice, NoticeLevel};
