use super::view_layout::Styles;
use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Something a [`ListViewer`] can draw as one row.
pub trait ListRow {
    fn row(&self, width: usize) -> Line<'static>;
}

/// A bordered list that keeps the selected row in view. Only the scroll
/// offset lives here; the selection itself belongs to the state.
pub struct ListViewer {
    pub title: String,
    pub empty_message: String,
    pub scroll_offset: usize,
}

impl ListViewer {
    pub fn new(title: impl Into<String>, empty_message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            empty_message: empty_message.into(),
            scroll_offset: 0,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Scroll just far enough that `selected` is one of the `visible` rows.
    pub fn adjust_scroll_offset(&mut self, selected: usize, len: usize, visible: usize) {
        let visible = visible.max(1);
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + visible {
            self.scroll_offset = selected + 1 - visible;
        }
        self.scroll_offset = self.scroll_offset.min(len.saturating_sub(visible));
    }

    pub fn render<T: ListRow>(&mut self, f: &mut Frame, area: Rect, items: &[T], selected: usize) {
        if items.is_empty() {
            self.scroll_offset = 0;
            let empty = Paragraph::new(self.empty_message.as_str())
                .block(Block::default().title(self.title.as_str()).borders(Borders::ALL))
                .style(Styles::dimmed());
            f.render_widget(empty, area);
            return;
        }

        let visible = area.height.saturating_sub(2) as usize;
        let width = area.width.saturating_sub(2) as usize;
        self.adjust_scroll_offset(selected, items.len(), visible);
        let end = (self.scroll_offset + visible).min(items.len());

        let rows: Vec<ListItem> = items[self.scroll_offset..end]
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let row = ListItem::new(item.row(width));
                if self.scroll_offset + offset == selected {
                    row.style(Styles::selected())
                } else {
                    row
                }
            })
            .collect();

        let title = format!("{} ({}/{})", self.title, selected + 1, items.len());
        let list = List::new(rows).block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(list, area);
    }
}

/// Cut `text` to `width` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= width {
        return flat;
    }
    if width == 0 {
        return String::new();
    }
    let kept: String = flat.chars().take(width - 1).collect();
    format!("{kept}…")
}

/// `text` cut and padded to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate(text, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_scroll_offset_follows_selection() {
        let mut viewer = ListViewer::new("Entries", "none");
        viewer.adjust_scroll_offset(0, 50, 10);
        assert_eq!(viewer.scroll_offset, 0);
        viewer.adjust_scroll_offset(15, 50, 10);
        assert_eq!(viewer.scroll_offset, 6);
        viewer.adjust_scroll_offset(8, 50, 10);
        assert_eq!(viewer.scroll_offset, 6);
        viewer.adjust_scroll_offset(2, 50, 10);
        assert_eq!(viewer.scroll_offset, 2);
    }

    #[test]
    fn test_adjust_scroll_offset_after_list_shrinks() {
        let mut viewer = ListViewer::new("Entries", "none");
        viewer.adjust_scroll_offset(40, 50, 10);
        assert_eq!(viewer.scroll_offset, 31);
        viewer.adjust_scroll_offset(0, 3, 10);
        assert_eq!(viewer.scroll_offset, 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer line", 6), "a lon…");
        assert_eq!(truncate("two\nlines", 20), "two lines");
        assert_eq!(truncate("日本語テキスト", 5), "日本語テ…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn test_fit_pads() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }
}
