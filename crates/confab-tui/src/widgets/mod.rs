//! Custom widgets for the TUI

pub mod input_box;
pub mod message_list;
pub mod selector;
pub mod spinner;

pub use input_box::InputBox;
pub use message_list::{ChatMessage, MessageList, Sender};
pub use selector::{Selector, SelectorItem, SelectorState};
pub use spinner::Spinner;
