use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_FALLBACK_ERROR: &str = "Something went wrong. Please try again.";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
    /// Shown when the server gives no usable message, or the request never reached it.
    pub fallback_error_message: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("PORTAL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("PORTAL_API_URL not set, using empty value");
                    String::new()
                }),
            request_timeout_secs: match env::var("PORTAL_REQUEST_TIMEOUT_SECS") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORTAL_REQUEST_TIMEOUT_SECS is not a number ({}), using default", raw);
                    DEFAULT_TIMEOUT_SECS
                }),
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
            session_file: env::var("PORTAL_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("PORTAL_SESSION_FILE not set, using default");
                    PathBuf::from(".care-portal-session.json")
                }),
            fallback_error_message: env::var("PORTAL_FALLBACK_ERROR")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_ERROR.to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at an explicit base URL with defaults elsewhere.
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: PathBuf::from(".care-portal-session.json"),
            fallback_error_message: DEFAULT_FALLBACK_ERROR.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = AppConfig::for_base_url("http://localhost:8080/api/");
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert!(config.is_configured());
    }

    #[test]
    fn empty_base_url_is_not_configured() {
        let config = AppConfig::for_base_url("");
        assert!(!config.is_configured());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.fallback_error_message, DEFAULT_FALLBACK_ERROR);
    }
}
