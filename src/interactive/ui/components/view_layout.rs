use crate::backend::Level;
use crate::interactive::constants::{FOOTER_HEIGHT, HEADER_HEIGHT};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Header, body and footer shared by every screen.
pub struct ViewLayout {
    title: String,
    subtitle: Option<String>,
    status_text: Option<String>,
    status_style: Style,
}

impl ViewLayout {
    pub fn new(title: String) -> Self {
        Self {
            title,
            subtitle: None,
            status_text: None,
            status_style: Styles::dimmed(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: String) -> Self {
        self.subtitle = Some(subtitle);
        self
    }

    pub fn with_status_text(mut self, text: String) -> Self {
        self.status_text = Some(text);
        self
    }

    pub fn with_status_style(mut self, style: Style) -> Self {
        self.status_style = style;
        self
    }

    pub fn render<F>(&self, f: &mut Frame, area: Rect, render_content: F)
    where
        F: FnOnce(&mut Frame, Rect),
    {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.render_title_bar(f, chunks[0]);
        render_content(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);
    }

    fn render_title_bar(&self, f: &mut Frame, area: Rect) {
        let mut title_lines = vec![Line::from(Span::styled(self.title.as_str(), Styles::title()))];
        if let Some(subtitle) = &self.subtitle {
            title_lines.push(Line::from(Span::styled(subtitle.as_str(), Styles::subtitle())));
        }

        let title_block = Paragraph::new(title_lines)
            .block(Block::default().borders(Borders::BOTTOM))
            .alignment(Alignment::Left);
        f.render_widget(title_block, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = self
            .status_text
            .as_deref()
            .unwrap_or("j/k: Navigate | Enter: Open | Esc: Back | ?: Help");
        let status_bar = Paragraph::new(status_text)
            .style(self.status_style)
            .alignment(Alignment::Left);
        f.render_widget(status_bar, area);
    }
}

/// A box of at most `max_width` x `height` centred in `area`, leaving
/// `margin` cells free on every side.
pub fn centered_rect(area: Rect, max_width: u16, height: u16, margin: u16) -> Rect {
    let width = max_width.min(area.width.saturating_sub(margin * 2)).max(1);
    let height = height.min(area.height.saturating_sub(margin * 2)).max(1);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

pub struct ColorScheme;

impl ColorScheme {
    pub const PRIMARY: Color = Color::Cyan;
    pub const SECONDARY: Color = Color::Yellow;
    pub const ACCENT: Color = Color::Magenta;
    pub const TEXT: Color = Color::White;
    pub const TEXT_DIM: Color = Color::DarkGray;
    pub const SELECTION: Color = Color::DarkGray;
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
}

pub struct Styles;

impl Styles {
    pub fn title() -> Style {
        Style::default()
            .fg(ColorScheme::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn subtitle() -> Style {
        Style::default().fg(ColorScheme::TEXT_DIM)
    }

    pub fn label() -> Style {
        Style::default().fg(ColorScheme::SECONDARY)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(ColorScheme::SELECTION)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(ColorScheme::TEXT)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(ColorScheme::TEXT_DIM)
    }

    pub fn accent() -> Style {
        Style::default().fg(ColorScheme::ACCENT)
    }

    pub fn action_key() -> Style {
        Style::default().fg(ColorScheme::SECONDARY)
    }

    pub fn success() -> Style {
        Style::default()
            .fg(ColorScheme::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default()
            .fg(ColorScheme::WARNING)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(ColorScheme::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn level(level: Option<Level>) -> Style {
        match level {
            Some(Level::Fatal | Level::Error) => Style::default().fg(ColorScheme::ERROR),
            Some(Level::Warn) => Style::default().fg(ColorScheme::WARNING),
            Some(Level::Info) => Style::default().fg(ColorScheme::SUCCESS),
            Some(Level::Debug | Level::Trace) => Style::default().fg(Color::Blue),
            None => Self::dimmed(),
        }
    }
}
