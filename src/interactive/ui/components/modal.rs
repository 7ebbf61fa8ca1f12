use super::Component;
use super::text_panel::TextPanel;
use super::view_layout::{Styles, centered_rect};
use crate::interactive::constants::{MODAL_MARGIN, MODAL_MAX_WIDTH};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Clear, Paragraph},
};

/// A centred dialog drawn over whatever is underneath.
pub struct Modal<'a> {
    title: String,
    lines: Vec<Line<'a>>,
    scroll: usize,
    hint: &'static str,
    border_style: Style,
}

impl<'a> Modal<'a> {
    pub fn new(title: impl Into<String>, lines: Vec<Line<'a>>) -> Self {
        Self {
            title: title.into(),
            lines,
            scroll: 0,
            hint: "Esc: Close | y: Copy | j/k: Scroll",
            border_style: Styles::title(),
        }
    }

    pub fn from_strings(title: impl Into<String>, lines: &'a [String]) -> Self {
        Self::new(title, lines.iter().map(|l| Line::raw(l.as_str())).collect())
    }

    pub fn with_scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }
}

impl Component for Modal<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let content_width = self
            .lines
            .iter()
            .map(Line::width)
            .max()
            .unwrap_or(0)
            .max(self.title.chars().count() + 4)
            .max(self.hint.chars().count());
        let width = u16::try_from(content_width + 2).unwrap_or(u16::MAX).min(MODAL_MAX_WIDTH);
        let height = u16::try_from(self.lines.len() + 3).unwrap_or(u16::MAX);
        let dialog = centered_rect(area, width, height, MODAL_MARGIN);

        f.render_widget(Clear, dialog);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(dialog);

        TextPanel::new(self.title.clone(), std::mem::take(&mut self.lines))
            .with_scroll(self.scroll)
            .with_border_style(self.border_style)
            .render(f, chunks[0]);
        f.render_widget(Paragraph::new(self.hint).style(Styles::dimmed()), chunks[1]);
    }
}
