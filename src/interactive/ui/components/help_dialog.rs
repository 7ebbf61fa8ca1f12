use super::Component;
use super::modal::Modal;
use super::view_layout::Styles;
use crate::interactive::ui::content::HELP_SECTIONS;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
};

pub struct HelpDialog {
    scroll: usize,
}

impl HelpDialog {
    pub fn new(scroll: usize) -> Self {
        Self { scroll }
    }

    fn help_lines() -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (section, bindings) in HELP_SECTIONS {
            lines.push(Line::from(Span::styled(format!("{section}:"), Styles::warning())));
            for (keys, description) in *bindings {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {keys:<12}"), Styles::action_key()),
                    Span::raw(*description),
                ]));
            }
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Component for HelpDialog {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        Modal::new(" Help ", Self::help_lines())
            .with_scroll(self.scroll)
            .with_hint("Esc/?: Close | j/k: Scroll")
            .render(f, area);
    }
}
