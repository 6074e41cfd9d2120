//! Chat event types

use serde::{Deserialize, Serialize};

/// Events emitted while a submission is in flight.
///
/// `markup` is always a full re-render of everything received so far; it
/// replaces the output region rather than appending to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// The request was accepted and the response stream is being opened
    StreamStart,

    /// The render buffer grew; `markup` fully replaces the output region
    Rendered { text: String, markup: String },

    /// The stream completed and the exchange was committed to the transcript
    StreamEnd { text: String, markup: String },

    /// The request was cancelled; the partial text was committed as a
    /// truncated turn
    Cancelled { text: String, markup: String },

    /// The request failed; input is available again
    Error { message: String },
}

impl ChatEvent {
    /// Check if this event ends the in-flight request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::StreamEnd { .. } | ChatEvent::Cancelled { .. } | ChatEvent::Error { .. }
        )
    }
}
