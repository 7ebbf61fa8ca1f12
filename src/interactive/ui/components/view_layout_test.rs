#[cfg(test)]
mod tests {
    use super::super::view_layout::{ColorScheme, Styles, ViewLayout, centered_rect};
    use crate::backend::Level;
    use ratatui::{
        Terminal,
        backend::TestBackend,
        buffer::Buffer,
        layout::Rect,
        style::{Color, Modifier},
    };

    fn buffer_contains_text(buffer: &Buffer, text: &str) -> bool {
        let area = buffer.area;
        (0..area.height).any(|y| {
            let row: String = (0..area.width).map(|x| buffer[(x, y)].symbol()).collect();
            row.contains(text)
        })
    }

    #[test]
    fn test_view_layout_basic() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| {
                let layout = ViewLayout::new("obsterm · logs".to_string());
                layout.render(f, f.area(), |_f, area| {
                    assert_eq!(area.height, 16);
                    assert_eq!(area.width, 80);
                });
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert!(buffer_contains_text(buffer, "obsterm · logs"));
        assert!(buffer_contains_text(buffer, "Navigate"));
    }

    #[test]
    fn test_view_layout_with_subtitle_and_status() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| {
                ViewLayout::new("Title".to_string())
                    .with_subtitle("index=logs-*  last 15m".to_string())
                    .with_status_text("loading entries 3s".to_string())
                    .render(f, f.area(), |_f, _area| {});
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert!(buffer_contains_text(buffer, "index=logs-*  last 15m"));
        assert!(buffer_contains_text(buffer, "loading entries 3s"));
        assert!(!buffer_contains_text(buffer, "Navigate"));
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(area, 60, 10, 4), Rect::new(20, 15, 60, 10));
        // Clamped by the margin on small screens.
        assert_eq!(centered_rect(Rect::new(0, 0, 30, 10), 60, 20, 4), Rect::new(4, 4, 22, 2));
    }

    #[test]
    fn test_styles() {
        assert_eq!(Styles::title().fg, Some(ColorScheme::PRIMARY));
        assert!(Styles::title().add_modifier.contains(Modifier::BOLD));
        assert_eq!(Styles::level(Some(Level::Error)).fg, Some(ColorScheme::ERROR));
        assert_eq!(Styles::level(Some(Level::Warn)).fg, Some(ColorScheme::WARNING));
        assert_eq!(Styles::level(Some(Level::Debug)).fg, Some(Color::Blue));
        assert_eq!(Styles::level(None).fg, Some(ColorScheme::TEXT_DIM));
    }
}
