//! TUI implementation for confab

use std::time::Instant;

use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use tokio::sync::mpsc;

use confab_chat::{Chat, ChatEvent};
use confab_gateway::Provider;
use confab_tui::{
    Theme,
    input::Action,
    widgets::{
        ChatMessage, InputBox, MessageList, Selector, SelectorItem, SelectorState, Spinner,
        message_list,
    },
};

/// Messages sent from UI state to the driving loop
#[derive(Debug)]
pub enum UiMessage {
    /// User submitted input
    Submit(String),
    /// User requested quit
    Quit,
    /// User requested clear
    Clear,
    /// User requested abort of the in-flight request
    Abort,
    /// Slash command
    Command(String),
    /// Change provider (index into Provider::ALL)
    ChangeProvider(usize),
}

/// TUI application state
pub struct TuiState {
    /// Conversation view
    messages: Vec<ChatMessage>,
    /// Input box
    input: InputBox,
    /// Current scroll position (usize::MAX means follow the tail)
    scroll: usize,
    /// Whether a request is in flight
    is_streaming: bool,
    /// Current status message
    status: String,
    /// Theme
    theme: Theme,
    /// Selected provider (mirrors the chat session)
    provider: Provider,
    /// Channel to the driving loop
    ui_tx: mpsc::Sender<UiMessage>,
    /// Spinner start time for animation
    spinner_start: Instant,
    /// Provider selector popup state
    provider_selector: SelectorState,
}

impl TuiState {
    pub fn new(provider: Provider, ui_tx: mpsc::Sender<UiMessage>) -> Self {
        let mut input = InputBox::new().with_placeholder("Ask anything...");
        input.set_focused(true);

        Self {
            messages: vec![],
            input,
            scroll: 0,
            is_streaming: false,
            status: "Ready".to_string(),
            theme: Theme::dark(),
            provider,
            ui_tx,
            spinner_start: Instant::now(),
            provider_selector: SelectorState::default(),
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved against content height during render
        self.scroll = usize::MAX;
    }

    /// Show a system message
    pub fn show_system_message(&mut self, content: &str) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    /// Open the provider selector popup (refused while streaming)
    pub fn open_provider_selector(&mut self) {
        if self.is_streaming {
            return;
        }
        self.provider_selector.selected = Provider::ALL
            .iter()
            .position(|p| *p == self.provider)
            .unwrap_or(0);
        self.provider_selector.show();
    }

    /// Record a provider switch: the visible history resets with the session
    pub fn apply_provider_change(&mut self, provider: Provider) {
        self.provider = provider;
        self.messages.clear();
        self.show_system_message(&format!(
            "Switched to {} (conversation cleared)",
            provider.label()
        ));
    }

    /// Handle chat events
    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::StreamStart => {
                self.is_streaming = true;
                // Fresh output region for the incoming response
                self.messages.push(ChatMessage::assistant_streaming(""));
                self.scroll_to_bottom();
            }
            ChatEvent::Rendered { markup, .. } => {
                // Full replacement of the output region, never an append
                if let Some(last) = self.messages.last_mut() {
                    if last.is_streaming {
                        last.content = markup;
                    }
                }
                self.scroll_to_bottom();
            }
            ChatEvent::StreamEnd { markup, .. } => {
                self.finish_stream(markup);
                self.status = "Ready".to_string();
            }
            ChatEvent::Cancelled { markup, .. } => {
                self.finish_stream(markup);
                self.status = "Cancelled".to_string();
            }
            ChatEvent::Error { message } => {
                self.finish_stream(String::new());
                self.status = format!("Error: {}", message);
                self.messages.push(ChatMessage::error(format!(
                    "Error: {}",
                    message
                )));
            }
        }
    }

    fn finish_stream(&mut self, markup: String) {
        self.is_streaming = false;
        if let Some(last) = self.messages.last_mut() {
            if last.is_streaming {
                last.content = markup;
                last.is_streaming = false;
            }
        }
        self.scroll_to_bottom();
    }

    /// Handle keyboard action
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        // Provider selector takes priority while visible
        if self.provider_selector.visible {
            match action {
                Action::Up => self.provider_selector.up(Provider::ALL.len()),
                Action::Down => self.provider_selector.down(Provider::ALL.len()),
                Action::Submit => {
                    let selected = self.provider_selector.selected;
                    self.provider_selector.hide();
                    let _ = self.ui_tx.send(UiMessage::ChangeProvider(selected)).await;
                }
                Action::Escape | Action::ProviderSelect => {
                    self.provider_selector.hide();
                }
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                let content = self.input.content().to_string();
                if !content.is_empty() && !self.is_streaming {
                    self.input.clear();

                    if content.starts_with('/') {
                        let _ = self.ui_tx.send(UiMessage::Command(content)).await;
                    } else {
                        self.messages.push(ChatMessage::user(&content));
                        self.scroll_to_bottom();
                        let _ = self.ui_tx.send(UiMessage::Submit(content)).await;
                    }
                }
                true
            }
            Action::Quit | Action::Eof => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Interrupt | Action::Escape => {
                if self.is_streaming {
                    let _ = self.ui_tx.send(UiMessage::Abort).await;
                    self.status = "Cancelling...".to_string();
                    true
                } else {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    false
                }
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Clear => {
                let _ = self.ui_tx.send(UiMessage::Clear).await;
                true
            }
            Action::ProviderSelect => {
                self.open_provider_selector();
                true
            }
            _ => {
                self.input.handle_action(&action, width);
                true
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Layout: messages (flex), status bar (1), input (3)
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input
            .render(chunks[2], frame.buffer_mut(), &self.theme);

        if self.provider_selector.visible {
            self.render_provider_selector(frame, size);
        }
    }

    fn render_provider_selector(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<SelectorItem> = Provider::ALL
            .iter()
            .map(|p| SelectorItem {
                label: p.label().to_string(),
                description: Some(p.id().to_string()),
                is_current: *p == self.provider,
            })
            .collect();

        let selector = Selector::new("Select Provider", items, &self.theme)
            .with_selected(self.provider_selector.selected);

        selector.render_centered(area, frame.buffer_mut());
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!(" confab │ {} ", self.provider.label());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || self.messages.is_empty() {
            self.render_welcome(frame, inner);
            return;
        }

        let content_height =
            message_list::total_height(&self.messages, inner.width as usize, &self.theme);

        if self.scroll == usize::MAX {
            // Follow the tail of the stream
            self.scroll = content_height.saturating_sub(inner.height as usize);
        } else {
            self.scroll = self
                .scroll
                .min(content_height.saturating_sub(inner.height as usize));
        }

        let list = MessageList::new(&self.messages, &self.theme).scroll(self.scroll);
        frame.render_widget(list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_welcome(&self, frame: &mut Frame, area: Rect) {
        let welcome = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "  confab",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    " - chat with interchangeable providers",
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("  Provider: {}", self.provider.label()),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  Keybindings",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("    Enter     ", Style::default().fg(Color::Cyan)),
                Span::styled("Send message", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Ctrl+P    ", Style::default().fg(Color::Cyan)),
                Span::styled("Select provider", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Esc       ", Style::default().fg(Color::Cyan)),
                Span::styled("Stop streaming", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Ctrl+L    ", Style::default().fg(Color::Cyan)),
                Span::styled("Clear conversation", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Ctrl+C    ", Style::default().fg(Color::Cyan)),
                Span::styled("Abort / Quit", Style::default().fg(Color::White)),
            ]),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  Type a message to get started...",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(welcome, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.is_streaming {
            let spinner =
                Spinner::new(&self.status, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left_content = format!("{} │ {}", self.provider.label(), self.status);
        let right_content = "Ctrl+P: provider │ Ctrl+L: clear │ Ctrl+C: quit";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(&left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(Span::styled(&left_content, self.theme.dim_style()))
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Run the TUI application
pub async fn run_tui(chat: &mut Chat) -> anyhow::Result<()> {
    use crate::commands::{CommandResult, execute_command};
    use crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(chat.session().provider(), ui_tx);

    let mut chat_rx = chat.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for spinner animation
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    // Prompt queued by the UI, processed at the top of the next iteration so
    // the submit future can be pinned while `content` is in scope.
    let mut pending_prompt: Option<String> = None;

    let result = loop {
        if let Some(content) = pending_prompt.take() {
            state.is_streaming = true;
            state.spinner_start = Instant::now();
            state.status = "Waiting for response...".to_string();
            state.scroll_to_bottom();

            // Cancel handle works without borrowing the chat
            let handle = chat.handle();

            let mut submit_future = std::pin::pin!(chat.submit(&content));

            loop {
                // Render each iteration to keep the spinner moving
                terminal.draw(|frame| state.render(frame))?;
                let area_width = terminal.size()?.width;

                tokio::select! {
                    biased;

                    result = &mut submit_future => {
                        if let Err(e) = result {
                            state.status = format!("Error: {}", e);
                        }
                        break;
                    }

                    // Chat events first for streaming responsiveness
                    event = chat_rx.recv() => {
                        if let Ok(chat_event) = event {
                            state.handle_chat_event(chat_event);
                        }
                    }

                    event = event_stream.next() => {
                        match event {
                            Some(Ok(Event::Key(key))) => {
                                let action = confab_tui::input::key_to_action(key);
                                match action {
                                    Action::Interrupt | Action::Escape => {
                                        handle.abort();
                                        state.status = "Cancelling...".to_string();
                                    }
                                    Action::Quit => {
                                        disable_raw_mode()?;
                                        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                        terminal.show_cursor()?;
                                        return Ok(());
                                    }
                                    _ => {
                                        // Typing stays live during streaming
                                        state.input.handle_action(&action, area_width);
                                    }
                                }
                            }
                            Some(Ok(Event::Paste(text))) => {
                                state.input.handle_action(&Action::Paste(text), area_width);
                            }
                            Some(Ok(Event::Mouse(mouse))) => {
                                match mouse.kind {
                                    MouseEventKind::ScrollUp => {
                                        state.scroll = state.scroll.saturating_sub(3);
                                    }
                                    MouseEventKind::ScrollDown => {
                                        state.scroll = state.scroll.saturating_add(3);
                                    }
                                    _ => {}
                                }
                            }
                            Some(Ok(Event::Resize(_, _))) => {}
                            Some(Err(_)) | None => {
                                disable_raw_mode()?;
                                execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                terminal.show_cursor()?;
                                return Ok(());
                            }
                            _ => {}
                        }
                    }

                    _ = tick_interval.tick() => {}
                }
            }

            // Drain events emitted at stream end
            while let Ok(chat_event) = chat_rx.try_recv() {
                state.handle_chat_event(chat_event);
            }

            terminal.draw(|frame| state.render(frame))?;

            continue;
        }

        terminal.draw(|frame| state.render(frame))?;

        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            event = chat_rx.recv() => {
                if let Ok(chat_event) = event {
                    state.handle_chat_event(chat_event);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        let action = confab_tui::input::key_to_action(key);
                        if !state.handle_action(action, area_width).await {
                            break Ok(());
                        }
                    }
                    Some(Ok(Event::Paste(text))) => {
                        state.handle_action(Action::Paste(text), area_width).await;
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                state.scroll = state.scroll.saturating_sub(3);
                            }
                            MouseEventKind::ScrollDown => {
                                state.scroll = state.scroll.saturating_add(3);
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => {
                        break Ok(());
                    }
                    _ => {}
                }
            }

            _ = tick_interval.tick() => {}

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(content)) => {
                        pending_prompt = Some(content);
                    }
                    Some(UiMessage::Command(cmd)) => {
                        if let Some(result) = execute_command(&cmd, chat.session()) {
                            match result {
                                CommandResult::Message(msg) => {
                                    state.show_system_message(&msg);
                                }
                                CommandResult::Clear => {
                                    match chat.clear() {
                                        Ok(()) => {
                                            state.messages.clear();
                                            state.status = "Cleared".to_string();
                                        }
                                        Err(e) => state.show_system_message(&format!("Cannot clear: {}", e)),
                                    }
                                }
                                CommandResult::ChangeProvider(provider) => {
                                    match chat.set_provider(provider) {
                                        Ok(()) => state.apply_provider_change(provider),
                                        Err(e) => state.show_system_message(&format!("Cannot switch provider: {}", e)),
                                    }
                                }
                                CommandResult::OpenProviderSelector => {
                                    state.open_provider_selector();
                                }
                                CommandResult::Exit => {
                                    break Ok(());
                                }
                                CommandResult::Unknown(cmd) => {
                                    state.show_system_message(&format!("Unknown command: /{}\nType /help for available commands.", cmd));
                                }
                            }
                        }
                    }
                    Some(UiMessage::ChangeProvider(index)) => {
                        if let Some(provider) = Provider::ALL.get(index).copied() {
                            match chat.set_provider(provider) {
                                Ok(()) => state.apply_provider_change(provider),
                                Err(e) => state.show_system_message(&format!("Cannot switch provider: {}", e)),
                            }
                        }
                    }
                    Some(UiMessage::Clear) => {
                        match chat.clear() {
                            Ok(()) => {
                                state.messages.clear();
                                state.status = "Cleared".to_string();
                            }
                            Err(e) => state.show_system_message(&format!("Cannot clear: {}", e)),
                        }
                    }
                    Some(UiMessage::Abort) => {
                        chat.abort();
                    }
                    Some(UiMessage::Quit) | None => {
                        break Ok(());
                    }
                }
            }
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
