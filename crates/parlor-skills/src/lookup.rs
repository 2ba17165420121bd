//! Shared plumbing for the external lookup clients.

use std::time::Duration;

/// Why a lookup produced no answer. Each skill maps these to its own apology text.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider reported status {status}")]
    NotFound { status: String },
    #[error("provider returned no usable content")]
    NoContent,
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else if e.is_decode() {
            LookupError::Decode(e.to_string())
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

/// One client for every lookup: single attempt, fixed per-request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, LookupError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("parlor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LookupError::from)
}
