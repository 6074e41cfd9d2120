//! Conversation session: transcript, continuation token, provider selection.

use chrono::{DateTime, Utc};
use confab_gateway::{Provider, Transcript};

/// State for one conversation, scoped to a provider selection.
///
/// Encoding schemes and continuation semantics are not comparable across
/// providers, so changing the provider resets the transcript and discards the
/// continuation token.
pub struct Session {
    provider: Provider,
    transcript: Transcript,
    last_message_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for `provider`
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            transcript: Transcript::new(),
            last_message_id: None,
            created_at: Utc::now(),
        }
    }

    /// The currently selected provider
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// When this session (or its last reset) started
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The conversation so far
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Continuation token captured from the last successful response
    pub fn last_message_id(&self) -> Option<&str> {
        self.last_message_id.as_deref()
    }

    /// Record the continuation token from a response header
    pub fn set_last_message_id(&mut self, id: impl Into<String>) {
        self.last_message_id = Some(id.into());
    }

    /// Switch provider, resetting transcript and continuation token.
    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = provider;
        self.reset();
    }

    /// Drop all conversation state while keeping the provider selection.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.last_message_id = None;
        self.created_at = Utc::now();
    }

    /// Append the submitted prompt as the pending user turn
    pub fn begin_turn(&mut self, prompt: impl Into<String>) {
        self.transcript.push_user(prompt);
    }

    /// Complete the pending exchange with the assistant's (possibly partial
    /// or empty) response text.
    pub fn complete_turn(&mut self, answer: impl Into<String>) {
        self.transcript.push_assistant(answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_pair_up() {
        let mut session = Session::new(Provider::DeepAi);
        session.begin_turn("hello");
        assert!(session.transcript().has_pending_user());

        session.complete_turn("hi there");
        assert!(!session.transcript().has_pending_user());
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_provider_switch_clears_history_and_token() {
        let mut session = Session::new(Provider::Bai);
        session.begin_turn("hello");
        session.complete_turn("hi");
        session.set_last_message_id("msg-7");

        session.set_provider(Provider::You);

        assert_eq!(session.provider(), Provider::You);
        assert!(session.transcript().is_empty());
        assert_eq!(session.last_message_id(), None);
    }

    #[test]
    fn test_switch_to_same_provider_still_resets() {
        let mut session = Session::new(Provider::Bai);
        session.begin_turn("hello");
        session.complete_turn("hi");
        session.set_last_message_id("msg-7");

        session.set_provider(Provider::Bai);

        assert!(session.transcript().is_empty());
        assert_eq!(session.last_message_id(), None);
    }
}
