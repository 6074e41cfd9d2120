//! confab-chat: Chat session runtime
//!
//! This crate owns the conversation session (transcript, continuation token,
//! provider selection), the incremental stream renderer, and the submission
//! driver that ties them to the gateway client.

pub mod chat;
pub mod error;
pub mod events;
pub mod handle;
pub mod render;
pub mod session;

pub use chat::Chat;
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use handle::ChatHandle;
pub use render::RenderBuffer;
pub use session::Session;
