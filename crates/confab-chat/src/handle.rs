//! A cloneable handle for poking the chat from external code.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// A cloneable handle for cancelling the in-flight request and observing
/// streaming state from outside the submission loop.
///
/// All fields are `Arc`-wrapped, so cloning is cheap. Each submission arms a
/// fresh cancellation token; the previous one is superseded, never reused.
#[derive(Clone)]
pub struct ChatHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) streaming: Arc<AtomicBool>,
}

impl ChatHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the in-flight request, if any.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Get the cancellation token (for external callers that need direct access).
    pub fn cancel_token(&self) -> Arc<Mutex<CancellationToken>> {
        Arc::clone(&self.cancel)
    }

    /// Whether a request is currently streaming.
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    /// Install a fresh token for the next request and return it.
    pub(crate) fn arm(&self) -> CancellationToken {
        let mut guard = self.cancel.lock();
        *guard = CancellationToken::new();
        guard.clone()
    }

    pub(crate) fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_supersedes_cancelled_token() {
        let handle = ChatHandle::new();

        let first = handle.arm();
        handle.abort();
        assert!(first.is_cancelled());

        let second = handle.arm();
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_streaming_flag_visible_across_clones() {
        let handle = ChatHandle::new();
        let observer = handle.clone();

        handle.set_streaming(true);
        assert!(observer.is_streaming());
        handle.set_streaming(false);
        assert!(!observer.is_streaming());
    }
}
