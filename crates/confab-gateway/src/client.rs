//! Streaming HTTP client for the ask gateway

use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::error::{Error, Result};
use crate::provider::Provider;

/// Response header carrying the continuation token, when the provider issues one
pub const MESSAGE_ID_HEADER: &str = "msg-id";

/// A stream of decoded UTF-8 text chunks from the response body
pub type TextChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A successful ask: the optional continuation token plus the body stream
pub struct AskResponse {
    /// Continuation token from the `msg-id` header, if present
    pub message_id: Option<String>,
    /// Incrementally decoded response text
    pub stream: TextChunkStream,
}

/// Trait for issuing ask requests, mockable in tests
#[async_trait]
pub trait Ask: Send + Sync {
    /// Send a prompt with optional encoded state, returning the token and stream
    async fn ask(
        &self,
        provider: Provider,
        prompt: &str,
        state: Option<&str>,
    ) -> Result<AskResponse>;
}

/// HTTP client for a confab gateway
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// The gateway base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Ask for GatewayClient {
    async fn ask(
        &self,
        provider: Provider,
        prompt: &str,
        state: Option<&str>,
    ) -> Result<AskResponse> {
        let url = format!("{}/api/ask", self.base_url);

        let mut params = Vec::with_capacity(3);
        params.push(("provider", provider.id()));
        params.push(("prompt", prompt));
        if let Some(state) = state {
            params.push(("state", state));
        }

        tracing::debug!("asking {} via {}", provider.id(), url);

        let response = self.http.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                code: status.as_u16(),
            });
        }

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let mut bytes = response.bytes_stream();

        let chunks = stream! {
            let mut decoder = Utf8Decoder::new();

            while let Some(item) = bytes.next().await {
                match item {
                    Ok(chunk) => {
                        let text = decoder.push(&chunk);
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Err(err) => {
                        yield Err(Error::Http(err));
                        return;
                    }
                }
            }

            let rest = decoder.finish();
            if !rest.is_empty() {
                yield Ok(rest);
            }
        };

        Ok(AskResponse {
            message_id,
            stream: Box::pin(chunks),
        })
    }
}

/// Incremental UTF-8 decoder for byte chunks arriving off the wire.
///
/// A multi-byte code point split across two chunks is carried over and
/// completed by the next push; invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text complete so far
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));

                    match err.error_len() {
                        Some(skip) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + skip);
                        }
                        None => {
                            // Incomplete trailing code point: keep for the next chunk
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush any carried bytes at end of stream
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_passes_ascii_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(b"Hi"), "Hi");
        assert_eq!(decoder.push(b"  there"), "  there");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_reassembles_split_code_point() {
        // "é" is 0xC3 0xA9; split it across two chunks.
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(&[0xC3]), "");
        assert_eq!(decoder.push(&[0xA9, b'!']), "é!");
    }

    #[test]
    fn test_decoder_reassembles_split_four_byte_sequence() {
        let crab = "🦀".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(&crab[..2]), "");
        assert_eq!(decoder.push(&crab[2..]), "🦀");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        let out = decoder.push(&[b'a', 0xFF, b'b']);
        assert_eq!(out, "a\u{FFFD}b");
    }

    #[test]
    fn test_decoder_finish_flushes_incomplete_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(&[b'x', 0xC3]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_client_normalizes_base_url() {
        let client = GatewayClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
