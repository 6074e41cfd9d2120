//! Error types for confab-gateway

use thiserror::Error;

/// Result type alias using confab-gateway Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the ask gateway
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("gateway returned status {code}")]
    Status { code: u16 },
}

impl Error {
    /// Check if this error came from a non-success gateway status
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }
}
