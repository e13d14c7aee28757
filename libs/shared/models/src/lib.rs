pub mod auth;
pub mod error;
pub mod response;

pub use auth::{Session, User, UserRole};
pub use error::PortalError;
pub use response::ApiEnvelope;
