//! The submission driver: encode state, ask, stream, finalize.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use confab_gateway::{Ask, Provider, encode_state};

use crate::error::{Error, Result};
use crate::events::ChatEvent;
use crate::handle::ChatHandle;
use crate::render::RenderBuffer;
use crate::session::Session;

/// How a stream run ended
enum StreamOutcome {
    Complete(RenderBuffer),
    Cancelled(RenderBuffer),
    Failed(confab_gateway::Error, RenderBuffer),
}

/// The conversation controller.
///
/// Owns the session and drives one submission at a time: the encoder runs
/// against the session, the gateway streams the response, and the render
/// buffer is re-rendered in full on every chunk. Consumers observe progress
/// through the broadcast event channel.
pub struct Chat {
    session: Session,
    gateway: Arc<dyn Ask>,
    event_tx: broadcast::Sender<ChatEvent>,
    handle: ChatHandle,
}

impl Chat {
    /// Create a chat for `provider` backed by `gateway`
    pub fn new(provider: Provider, gateway: Arc<dyn Ask>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            session: Session::new(provider),
            gateway,
            event_tx,
            handle: ChatHandle::new(),
        }
    }

    /// Subscribe to chat events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// The current session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get a cloneable handle for cancelling from outside
    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    /// Whether a request is in flight
    pub fn is_streaming(&self) -> bool {
        self.handle.is_streaming()
    }

    /// Cancel the in-flight request, if any
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Switch provider. Resets the transcript and continuation token; refused
    /// while a request is in flight (the selector is disabled then).
    pub fn set_provider(&mut self, provider: Provider) -> Result<()> {
        if self.handle.is_streaming() {
            return Err(Error::Busy);
        }
        self.session.set_provider(provider);
        Ok(())
    }

    /// Drop the conversation, keeping the provider selection
    pub fn clear(&mut self) -> Result<()> {
        if self.handle.is_streaming() {
            return Err(Error::Busy);
        }
        self.session.reset();
        Ok(())
    }

    /// Submit a prompt and drive the response to completion, cancellation, or
    /// failure. Every path commits the exchange, retires the cancellation
    /// token, and leaves the chat ready for the next submission; transport
    /// failures surface as events, not errors.
    pub async fn submit(&mut self, prompt: &str) -> Result<()> {
        if self.handle.is_streaming() {
            return Err(Error::Busy);
        }

        self.session.begin_turn(prompt);
        let state = encode_state(
            self.session.provider(),
            self.session.transcript(),
            self.session.last_message_id(),
        );

        self.handle.set_streaming(true);
        let cancel = self.handle.arm();
        let outcome = self.run_stream(prompt, state.as_deref(), &cancel).await;
        self.handle.set_streaming(false);

        match outcome {
            StreamOutcome::Complete(buffer) => {
                let markup = buffer.render();
                let text = buffer.into_text();
                self.session.complete_turn(text.clone());
                let _ = self.event_tx.send(ChatEvent::StreamEnd { text, markup });
            }
            StreamOutcome::Cancelled(buffer) => {
                tracing::debug!("request cancelled with {} bytes buffered", buffer.text().len());
                let markup = buffer.render();
                let text = buffer.into_text();
                // The partial response stays: committed as a truncated turn.
                self.session.complete_turn(text.clone());
                let _ = self.event_tx.send(ChatEvent::Cancelled { text, markup });
            }
            StreamOutcome::Failed(err, buffer) => {
                tracing::warn!("ask failed: {err}");
                self.session.complete_turn(buffer.into_text());
                let _ = self.event_tx.send(ChatEvent::Error {
                    message: err.to_string(),
                });
            }
        }

        Ok(())
    }

    async fn run_stream(
        &mut self,
        prompt: &str,
        state: Option<&str>,
        cancel: &CancellationToken,
    ) -> StreamOutcome {
        let _ = self.event_tx.send(ChatEvent::StreamStart);

        let ask = self.gateway.ask(self.session.provider(), prompt, state);
        let response = tokio::select! {
            response = ask => match response {
                Ok(response) => response,
                Err(err) => return StreamOutcome::Failed(err, RenderBuffer::new()),
            },
            _ = cancel.cancelled() => return StreamOutcome::Cancelled(RenderBuffer::new()),
        };

        if let Some(id) = response.message_id {
            self.session.set_last_message_id(id);
        }

        let mut stream = response.stream;
        let mut buffer = RenderBuffer::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return StreamOutcome::Cancelled(buffer),
                chunk = stream.next() => match chunk {
                    Some(Ok(text)) => {
                        buffer.push_chunk(&text);
                        let _ = self.event_tx.send(ChatEvent::Rendered {
                            text: buffer.text().to_owned(),
                            markup: buffer.render(),
                        });
                    }
                    Some(Err(err)) => return StreamOutcome::Failed(err, buffer),
                    None => return StreamOutcome::Complete(buffer),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confab_gateway::{AskResponse, TextChunkStream};
    use std::time::Duration;

    struct ScriptedGateway {
        chunks: Vec<&'static str>,
        message_id: Option<&'static str>,
        hang_after: bool,
        fail_status: Option<u16>,
    }

    impl ScriptedGateway {
        fn streaming(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                message_id: None,
                hang_after: false,
                fail_status: None,
            }
        }
    }

    #[async_trait]
    impl Ask for ScriptedGateway {
        async fn ask(
            &self,
            _provider: Provider,
            _prompt: &str,
            _state: Option<&str>,
        ) -> confab_gateway::Result<AskResponse> {
            if let Some(code) = self.fail_status {
                return Err(confab_gateway::Error::Status { code });
            }
            let items: Vec<confab_gateway::Result<String>> =
                self.chunks.iter().map(|c| Ok((*c).to_owned())).collect();
            let stream: TextChunkStream = if self.hang_after {
                Box::pin(futures::stream::iter(items).chain(futures::stream::pending()))
            } else {
                Box::pin(futures::stream::iter(items))
            };
            Ok(AskResponse {
                message_id: self.message_id.map(str::to_owned),
                stream,
            })
        }
    }

    fn drain(events: &mut broadcast::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_stream_accumulates_chunks() {
        let gateway = ScriptedGateway::streaming(vec!["Hi", "  there"]);
        let mut chat = Chat::new(Provider::DeepAi, Arc::new(gateway));
        let mut events = chat.subscribe();

        chat.submit("Hello").await.unwrap();

        assert_eq!(
            chat.session().transcript().turns(),
            &["Hello".to_string(), "Hi  there".to_string()]
        );

        let events = drain(&mut events);
        let rendered: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::Rendered { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(rendered, vec!["Hi", "Hi  there"]);
        assert!(matches!(
            events.last(),
            Some(ChatEvent::StreamEnd { text, .. }) if text == "Hi  there"
        ));
    }

    #[tokio::test]
    async fn test_message_id_captured_for_next_turn() {
        let gateway = ScriptedGateway {
            message_id: Some("msg-42"),
            ..ScriptedGateway::streaming(vec!["ok"])
        };
        let mut chat = Chat::new(Provider::Bai, Arc::new(gateway));

        chat.submit("Hello").await.unwrap();

        assert_eq!(chat.session().last_message_id(), Some("msg-42"));
        assert!(!chat.is_streaming());
    }

    #[tokio::test]
    async fn test_failed_ask_leaves_no_token_and_reenables() {
        let gateway = ScriptedGateway {
            fail_status: Some(500),
            ..ScriptedGateway::streaming(vec![])
        };
        let mut chat = Chat::new(Provider::Bai, Arc::new(gateway));
        let mut events = chat.subscribe();

        chat.submit("Hello").await.unwrap();

        assert_eq!(chat.session().last_message_id(), None);
        assert!(!chat.is_streaming());
        // The pending turn is paired off with an empty answer.
        assert_eq!(
            chat.session().transcript().turns(),
            &["Hello".to_string(), String::new()]
        );
        assert!(
            drain(&mut events)
                .iter()
                .any(|e| matches!(e, ChatEvent::Error { .. }))
        );
    }

    #[tokio::test]
    async fn test_cancel_commits_partial_turn() {
        let gateway = ScriptedGateway {
            hang_after: true,
            ..ScriptedGateway::streaming(vec!["partial answer"])
        };
        let mut chat = Chat::new(Provider::DeepAi, Arc::new(gateway));
        let mut events = chat.subscribe();

        let handle = chat.handle();
        let aborter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.abort();
        });

        chat.submit("Hello").await.unwrap();
        aborter.await.unwrap();

        assert!(!chat.is_streaming());
        assert_eq!(
            chat.session().transcript().turns(),
            &["Hello".to_string(), "partial answer".to_string()]
        );
        assert!(
            drain(&mut events)
                .iter()
                .any(|e| matches!(e, ChatEvent::Cancelled { text, .. } if text == "partial answer"))
        );
    }

    #[tokio::test]
    async fn test_submit_refused_while_streaming() {
        let gateway = ScriptedGateway::streaming(vec![]);
        let mut chat = Chat::new(Provider::DeepAi, Arc::new(gateway));

        chat.handle().set_streaming(true);
        assert!(matches!(chat.submit("Hello").await, Err(Error::Busy)));
        assert!(matches!(
            chat.set_provider(Provider::Bai),
            Err(Error::Busy)
        ));
    }

    #[tokio::test]
    async fn test_provider_switch_resets_session() {
        let gateway = ScriptedGateway {
            message_id: Some("msg-1"),
            ..ScriptedGateway::streaming(vec!["answer"])
        };
        let mut chat = Chat::new(Provider::Bai, Arc::new(gateway));

        chat.submit("Hello").await.unwrap();
        assert_eq!(chat.session().transcript().len(), 2);
        assert!(chat.session().last_message_id().is_some());

        chat.set_provider(Provider::You).unwrap();
        assert!(chat.session().transcript().is_empty());
        assert_eq!(chat.session().last_message_id(), None);
    }

    #[tokio::test]
    async fn test_state_encoded_from_prior_turns_only() {
        // The second submission must encode exactly the first exchange.
        struct Recorder {
            inner: parking_lot::Mutex<Vec<Option<String>>>,
        }

        #[async_trait]
        impl Ask for Recorder {
            async fn ask(
                &self,
                _provider: Provider,
                _prompt: &str,
                state: Option<&str>,
            ) -> confab_gateway::Result<AskResponse> {
                self.inner.lock().push(state.map(str::to_owned));
                let stream: TextChunkStream =
                    Box::pin(futures::stream::iter(vec![Ok("answer".to_owned())]));
                Ok(AskResponse {
                    message_id: None,
                    stream,
                })
            }
        }

        let recorder = Arc::new(Recorder {
            inner: parking_lot::Mutex::new(Vec::new()),
        });
        let mut chat = Chat::new(Provider::DeepAi, recorder.clone());

        chat.submit("First").await.unwrap();
        chat.submit("Next").await.unwrap();

        let states = recorder.inner.lock();
        assert_eq!(states[0], None);

        let entries: Vec<serde_json::Value> =
            serde_json::from_str(states[1].as_deref().unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["role"], "user");
        assert_eq!(entries[0]["content"], "First");
        assert_eq!(entries[1]["role"], "assistant");
        assert_eq!(entries[1]["content"], "answer");
    }
}
