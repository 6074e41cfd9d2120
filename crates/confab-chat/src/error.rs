//! Error types for confab-chat

use thiserror::Error;

/// Result type alias using confab-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the chat runtime
#[derive(Error, Debug)]
pub enum Error {
    /// The gateway request or stream failed
    #[error(transparent)]
    Gateway(#[from] confab_gateway::Error),

    /// A request is already in flight
    #[error("a request is already in flight")]
    Busy,
}
