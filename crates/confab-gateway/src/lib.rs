//! confab-gateway: Client for the multi-provider ask gateway
//!
//! This crate provides the provider identifiers, the conversation transcript,
//! the per-provider context encoding, and the streaming HTTP client for the
//! gateway's `GET /api/ask` endpoint.

pub mod client;
pub mod encode;
pub mod error;
pub mod history;
pub mod provider;

pub use client::{Ask, AskResponse, GatewayClient, MESSAGE_ID_HEADER, TextChunkStream};
pub use encode::encode_state;
pub use error::{Error, Result};
pub use history::{Role, Transcript};
pub use provider::{Provider, StateFormat};
