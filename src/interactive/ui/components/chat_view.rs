use super::Component;
use super::text_input::TextInput;
use super::view_layout::Styles;
use crate::backend::{ChatMessage, ChatRole};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Conversation history above a one-line prompt. The history sticks to
/// the newest message unless the user scrolled back.
pub struct ChatView<'a> {
    messages: &'a [ChatMessage],
    input: &'a TextInput,
    scroll_back: usize,
    waiting: bool,
}

impl<'a> ChatView<'a> {
    pub fn new(messages: &'a [ChatMessage], input: &'a TextInput) -> Self {
        Self {
            messages,
            input,
            scroll_back: 0,
            waiting: false,
        }
    }

    pub fn with_scroll_back(mut self, scroll_back: usize) -> Self {
        self.scroll_back = scroll_back;
        self
    }

    pub fn with_waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    fn history_lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for message in self.messages {
            let (label, style) = match message.role {
                ChatRole::User => ("you", Styles::action_key()),
                ChatRole::Assistant => ("assistant", Styles::title()),
            };
            lines.push(Line::from(Span::styled(format!("{label}:"), style)));
            lines.extend(message.content.lines().map(|l| Line::raw(format!("  {l}"))));
            lines.push(Line::from(""));
        }
        if self.waiting {
            lines.push(Line::styled("assistant is thinking…", Styles::dimmed()));
        }
        lines
    }
}

impl Component for ChatView<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let lines = self.history_lines();
        let empty = lines.is_empty();
        let history = Paragraph::new(lines).wrap(Wrap { trim: false });
        let visible = chunks[0].height.saturating_sub(2) as usize;
        let total = history.line_count(chunks[0].width.saturating_sub(2));
        let bottom = total.saturating_sub(visible);
        let top = bottom.saturating_sub(self.scroll_back);

        let history = if empty {
            Paragraph::new("Ask about the entries on screen. Enter sends, Esc closes.")
                .style(Styles::dimmed())
        } else {
            history.scroll((u16::try_from(top).unwrap_or(u16::MAX), 0))
        };
        f.render_widget(
            history.block(Block::default().title(" Chat ").borders(Borders::ALL)),
            chunks[0],
        );

        let prompt = Paragraph::new(Line::from(self.input.render_cursor_spans(false)))
            .block(Block::default().title(" Prompt ").borders(Borders::ALL));
        f.render_widget(prompt, chunks[1]);
    }
}
