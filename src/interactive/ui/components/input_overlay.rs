use super::Component;
use super::text_input::TextInput;
use super::view_layout::{Styles, centered_rect};
use crate::interactive::constants::MODAL_MARGIN;
use crate::interactive::ui::app_state::{CredentialField, CredentialsForm};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const SEARCH_HINT: &str = "Enter: Apply | Esc: Cancel | e.g. level:error AND \"timeout\" OR /5\\d\\d/";

/// Query editor drawn across the top of the body.
pub struct SearchBar<'a> {
    input: &'a TextInput,
}

impl<'a> SearchBar<'a> {
    pub fn new(input: &'a TextInput) -> Self {
        Self { input }
    }
}

impl Component for SearchBar<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let bar = Rect::new(area.x, area.y, area.width, area.height.min(4));
        f.render_widget(Clear, bar);
        let lines = vec![
            Line::from(
                std::iter::once(Span::styled("Search: ", Styles::label()))
                    .chain(self.input.render_cursor_spans(false))
                    .collect::<Vec<_>>(),
            ),
            Line::styled(SEARCH_HINT, Styles::dimmed()),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::title())
                .title(" Query "),
        );
        f.render_widget(paragraph, bar);
    }
}

/// Username and masked secret, Tab switches fields.
pub struct CredentialsDialog<'a> {
    form: &'a CredentialsForm,
}

impl<'a> CredentialsDialog<'a> {
    pub fn new(form: &'a CredentialsForm) -> Self {
        Self { form }
    }

    fn field_line(label: &'static str, input: &TextInput, focused: bool, mask: bool) -> Line<'static> {
        let label_style = if focused {
            Styles::action_key()
        } else {
            Styles::dimmed()
        };
        let mut spans = vec![Span::styled(format!("{label:<10}"), label_style)];
        if focused {
            spans.extend(input.render_cursor_spans(mask));
        } else if mask {
            spans.push(Span::raw("•".repeat(input.text().chars().count())));
        } else {
            spans.push(Span::raw(input.text().to_string()));
        }
        Line::from(spans)
    }
}

impl Component for CredentialsDialog<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let dialog = centered_rect(area, 60, 7, MODAL_MARGIN);
        f.render_widget(Clear, dialog);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(dialog);

        let lines = vec![
            Self::field_line(
                "Username",
                &self.form.username,
                self.form.focus == CredentialField::Username,
                false,
            ),
            Line::from(""),
            Self::field_line(
                "Secret",
                &self.form.secret,
                self.form.focus == CredentialField::Secret,
                true,
            ),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::title())
                .title(" Credentials "),
        );
        f.render_widget(paragraph, chunks[0]);
        f.render_widget(
            Paragraph::new("Tab: Switch field | Enter: Apply | Esc: Cancel").style(Styles::dimmed()),
            chunks[1],
        );
    }
}
