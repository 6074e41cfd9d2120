//! Message list widget for displaying the conversation

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// A single message in the conversation view.
///
/// Assistant content arrives pre-rendered as display markup; the widget never
/// interprets markdown itself.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub is_error: bool,
    pub is_streaming: bool,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            is_error: false,
            is_streaming: false,
        }
    }

    /// Create a completed assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: content.into(),
            is_error: false,
            is_streaming: false,
        }
    }

    /// Create an assistant message that is still streaming
    pub fn assistant_streaming(content: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::assistant(content)
        }
    }

    /// Create a system notice
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            content: content.into(),
            is_error: false,
            is_streaming: false,
        }
    }

    /// Create an error notice
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::system(content)
        }
    }
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    /// Create a new message list
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// Set scroll offset (in lines)
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

fn header(msg: &ChatMessage, theme: &Theme) -> Line<'static> {
    let (prefix, name, style) = match msg.sender {
        Sender::User => ("▶ ", "You", theme.accent_bold()),
        Sender::Assistant => (
            "◀ ",
            "Assistant",
            theme.success_style().add_modifier(Modifier::BOLD),
        ),
        Sender::System => (
            "● ",
            "System",
            if msg.is_error {
                theme.error_style()
            } else {
                theme.dim_style()
            },
        ),
    };

    let text = if msg.is_streaming {
        format!("{}{} ▌", prefix, name)
    } else {
        format!("{}{}", prefix, name)
    };
    Line::from(Span::styled(text, style))
}

fn content_lines(msg: &ChatMessage, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let style = match msg.sender {
        Sender::User | Sender::Assistant => theme.base_style(),
        Sender::System if msg.is_error => theme.error_style(),
        Sender::System => theme.dim_style(),
    };

    let mut lines = Vec::new();
    for content_line in msg.content.lines() {
        for wrapped in textwrap::wrap(content_line, width.max(1)) {
            lines.push(Line::from(Span::styled(
                format!("  {}", wrapped),
                style,
            )));
        }
    }
    if msg.content.is_empty() && msg.is_streaming {
        lines.push(Line::from(Span::styled("  …", theme.dim_style())));
    }
    lines
}

fn message_lines(msg: &ChatMessage, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![header(msg, theme)];
    lines.extend(content_lines(msg, width, theme));
    lines.push(Line::from(""));
    lines
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = (area.width as usize).saturating_sub(2);
        let mut all_lines: Vec<Line> = Vec::new();
        for msg in self.messages {
            all_lines.extend(message_lines(msg, width, self.theme));
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total display height of `messages` at `width`, matching what `MessageList`
/// renders line for line (used to clamp the scroll offset).
pub fn total_height(messages: &[ChatMessage], width: usize, theme: &Theme) -> usize {
    let content_width = width.saturating_sub(2);
    messages
        .iter()
        .map(|msg| message_lines(msg, content_width, theme).len())
        .sum()
}
