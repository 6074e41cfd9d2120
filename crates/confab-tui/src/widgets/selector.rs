//! Selector popup widget for choosing from a list of options

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Widget},
};

/// Maximum width for selector popups
const MAX_POPUP_WIDTH: u16 = 60;

/// An item in the selector
pub struct SelectorItem {
    /// Display label
    pub label: String,
    /// Optional description shown after the label
    pub description: Option<String>,
    /// Whether this item is currently active
    pub is_current: bool,
}

/// A popup selector for choosing from a list of options
pub struct Selector<'a> {
    title: String,
    items: Vec<SelectorItem>,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    /// Create a new selector; the current item starts selected
    pub fn new(title: impl Into<String>, items: Vec<SelectorItem>, theme: &'a Theme) -> Self {
        let selected = items.iter().position(|item| item.is_current).unwrap_or(0);
        Self {
            title: title.into(),
            items,
            selected,
            theme,
        }
    }

    /// Set the selected index
    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    fn popup_size(&self) -> (u16, u16) {
        let mut max_width = self.title.len() + 4;
        for item in &self.items {
            let desc = item.description.as_deref().map_or(0, |d| d.len() + 3);
            max_width = max_width.max(item.label.len() + desc + 6);
        }
        let width = (max_width as u16).clamp(20, MAX_POPUP_WIDTH);
        let height = (self.items.len() as u16 + 2).min(20);
        (width, height)
    }

    /// Render the selector centered in the given area
    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size();
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup = Rect::new(x, y, width.min(area.width), height.min(area.height));

        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let prefix = if item.is_current { "● " } else { "  " };
                let style = if i == self.selected {
                    Style::default()
                        .bg(self.theme.accent)
                        .fg(self.theme.bg)
                        .add_modifier(Modifier::BOLD)
                } else if item.is_current {
                    self.theme.accent_style()
                } else {
                    self.theme.base_style()
                };

                let mut text = format!("{}{}", prefix, item.label);
                if let Some(desc) = &item.description {
                    text.push_str(&format!("  ({})", desc));
                }
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));

        ratatui::widgets::StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and selection state for a selector popup
#[derive(Default)]
pub struct SelectorState {
    /// Currently selected index
    pub selected: usize,
    /// Whether the selector is visible
    pub visible: bool,
}

impl SelectorState {
    /// Show the selector
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hide the selector
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move selection up, wrapping
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = item_count - 1;
        }
    }

    /// Move selection down, wrapping
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        if self.selected < item_count - 1 {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }
}
