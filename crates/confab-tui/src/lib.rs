//! confab-tui: Terminal UI components
//!
//! Lightweight chat UI building blocks on ratatui and crossterm. This crate
//! knows nothing about providers or streaming; it only displays what it is
//! given.

pub mod input;
pub mod theme;
pub mod widgets;

pub use theme::Theme;
