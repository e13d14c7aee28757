use thiserror::Error;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortalError {
    /// Advisory client-side check failed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server answered with `success: false` or an error status.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl PortalError {
    /// Text to show inline. Validation and server messages pass through verbatim;
    /// everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PortalError::Validation(msg) | PortalError::Forbidden(msg) => msg.clone(),
            PortalError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            PortalError::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PortalError::Validation(_))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Decode(err.to_string())
    }
}
