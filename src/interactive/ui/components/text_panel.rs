use super::Component;
use super::view_layout::Styles;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Bordered, wrapped, vertically scrolled text.
pub struct TextPanel<'a> {
    title: String,
    lines: Vec<Line<'a>>,
    scroll: usize,
    border_style: Style,
}

impl<'a> TextPanel<'a> {
    pub fn new(title: impl Into<String>, lines: Vec<Line<'a>>) -> Self {
        Self {
            title: title.into(),
            lines,
            scroll: 0,
            border_style: Style::default(),
        }
    }

    /// Plain lines; section headers (lines ending in ':') are highlighted.
    pub fn from_strings(title: impl Into<String>, lines: &'a [String]) -> Self {
        let lines = lines
            .iter()
            .map(|line| {
                if line.ends_with(':') && !line.starts_with(' ') {
                    Line::styled(line.as_str(), Styles::label())
                } else {
                    Line::raw(line.as_str())
                }
            })
            .collect();
        Self::new(title, lines)
    }

    pub fn with_scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    /// Largest useful scroll offset once wrapping at `area` is applied.
    pub fn max_scroll(&self, area: Rect) -> usize {
        let inner_width = area.width.saturating_sub(2);
        let visible = area.height.saturating_sub(2) as usize;
        let rendered = Paragraph::new(self.lines.clone())
            .wrap(Wrap { trim: false })
            .line_count(inner_width);
        rendered.saturating_sub(visible)
    }
}

impl Component for TextPanel<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let scroll = self.scroll.min(self.max_scroll(area));
        let title = if scroll > 0 {
            format!("{} [+{scroll}]", self.title)
        } else {
            self.title.clone()
        };
        let paragraph = Paragraph::new(std::mem::take(&mut self.lines))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(self.border_style),
            )
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn test_max_scroll_accounts_for_wrapping() {
        let lines: Vec<String> = (0..5).map(|i| format!("line {i}")).collect();
        let panel = TextPanel::from_strings("t", &lines);
        assert_eq!(panel.max_scroll(Rect::new(0, 0, 20, 12)), 0);
        assert_eq!(panel.max_scroll(Rect::new(0, 0, 20, 5)), 2);

        let long = vec!["x".repeat(36)];
        let panel = TextPanel::from_strings("t", &long);
        // 36 chars wrap into two 18-wide rows; one visible row.
        assert_eq!(panel.max_scroll(Rect::new(0, 0, 20, 3)), 1);
    }

    #[test]
    fn test_scroll_is_clamped_when_rendering() {
        let lines: Vec<String> = (0..3).map(|i| format!("row {i}")).collect();
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        terminal
            .draw(|f| {
                TextPanel::from_strings("Detail", &lines)
                    .with_scroll(50)
                    .render(f, f.area());
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let row: String = (0..20).map(|x| buffer[(x, 1)].symbol()).collect();
        assert!(row.contains("row 0"));
    }
}
