use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Color, Style},
    text::Span,
};

/// Single-line editable text with an emacs-style cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor_position: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_text(text.into());
        input
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Set the text and move cursor to the end
    pub fn set_text(&mut self, text: String) {
        self.cursor_position = text.chars().count();
        self.text = text;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }

    /// Hand out the text, leaving the input empty.
    pub fn take(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.text)
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len())
    }

    fn find_prev_word_boundary(&self, from: usize) -> usize {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = from;
        while pos > 0 && chars.get(pos - 1).is_some_and(|c| c.is_whitespace()) {
            pos -= 1;
        }
        while pos > 0 && chars.get(pos - 1).is_some_and(|c| !c.is_whitespace()) {
            pos -= 1;
        }
        pos
    }

    fn find_next_word_boundary(&self, from: usize) -> usize {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = from;
        let len = chars.len();
        while pos < len && chars.get(pos).is_some_and(|c| !c.is_whitespace()) {
            pos += 1;
        }
        while pos < len && chars.get(pos).is_some_and(|c| c.is_whitespace()) {
            pos += 1;
        }
        pos
    }

    /// Delete chars in `[start, end)`; returns whether anything changed.
    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end || end > self.char_count() {
            return false;
        }
        let byte_start = self.byte_offset(start);
        let byte_end = self.byte_offset(end);
        self.text.drain(byte_start..byte_end);
        self.cursor_position = start;
        true
    }

    fn backspace(&mut self) -> bool {
        if self.cursor_position == 0 {
            return false;
        }
        self.delete_range(self.cursor_position - 1, self.cursor_position)
    }

    fn delete_under_cursor(&mut self) -> bool {
        let position = self.cursor_position;
        let changed = self.delete_range(position, position + 1);
        self.cursor_position = position;
        changed
    }

    /// Text with the cursor drawn as a reversed cell. `mask` hides the
    /// characters themselves.
    pub fn render_cursor_spans(&self, mask: bool) -> Vec<Span<'static>> {
        let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
        let shown: String = if mask {
            "•".repeat(self.char_count())
        } else {
            self.text.clone()
        };

        let mut before = String::new();
        let mut at = None;
        let mut after = String::new();
        for (i, c) in shown.chars().enumerate() {
            if i < self.cursor_position {
                before.push(c);
            } else if i == self.cursor_position {
                at = Some(c);
            } else {
                after.push(c);
            }
        }

        let mut spans = Vec::new();
        if !before.is_empty() {
            spans.push(Span::raw(before));
        }
        spans.push(Span::styled(at.unwrap_or(' ').to_string(), cursor_style));
        if !after.is_empty() {
            spans.push(Span::raw(after));
        }
        spans
    }

    /// Handle a key event and return true if the text changed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('a') => {
                    self.cursor_position = 0;
                    false
                }
                KeyCode::Char('e') => {
                    self.cursor_position = self.char_count();
                    false
                }
                KeyCode::Char('b') => {
                    self.cursor_position = self.cursor_position.saturating_sub(1);
                    false
                }
                KeyCode::Char('f') => {
                    self.cursor_position = (self.cursor_position + 1).min(self.char_count());
                    false
                }
                KeyCode::Char('h') => self.backspace(),
                KeyCode::Char('d') => self.delete_under_cursor(),
                KeyCode::Char('w') => {
                    let start = self.find_prev_word_boundary(self.cursor_position);
                    self.delete_range(start, self.cursor_position)
                }
                KeyCode::Char('u') => self.delete_range(0, self.cursor_position),
                KeyCode::Char('k') => {
                    let len = self.char_count();
                    let position = self.cursor_position;
                    let changed = self.delete_range(position, len);
                    self.cursor_position = position;
                    changed
                }
                _ => false,
            };
        }

        if key.modifiers.contains(KeyModifiers::ALT) {
            match key.code {
                KeyCode::Char('b') => {
                    self.cursor_position = self.find_prev_word_boundary(self.cursor_position);
                }
                KeyCode::Char('f') => {
                    self.cursor_position = self.find_next_word_boundary(self.cursor_position);
                }
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char(c) => {
                let byte_pos = self.byte_offset(self.cursor_position);
                self.text.insert(byte_pos, c);
                self.cursor_position += 1;
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_under_cursor(),
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor_position = (self.cursor_position + 1).min(self.char_count());
                false
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                false
            }
            KeyCode::End => {
                self.cursor_position = self.char_count();
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut TextInput, code: KeyCode) -> bool {
        input.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(input: &mut TextInput, c: char) -> bool {
        input.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = TextInput::new();
        for c in "héllo".chars() {
            assert!(press(&mut input, KeyCode::Char(c)));
        }
        assert_eq!(input.text(), "héllo");
        assert!(press(&mut input, KeyCode::Backspace));
        assert_eq!(input.text(), "héll");
        assert_eq!(input.cursor_position(), 4);
    }

    #[test]
    fn test_insert_in_middle_of_multibyte_text() {
        let mut input = TextInput::with_text("日本");
        press(&mut input, KeyCode::Left);
        assert!(press(&mut input, KeyCode::Char('x')));
        assert_eq!(input.text(), "日x本");
        assert!(press(&mut input, KeyCode::Delete));
        assert_eq!(input.text(), "日x");
        assert!(!press(&mut input, KeyCode::Delete));
    }

    #[test]
    fn test_control_editing() {
        let mut input = TextInput::with_text("level:error timeout");
        assert!(ctrl(&mut input, 'w'));
        assert_eq!(input.text(), "level:error ");
        ctrl(&mut input, 'a');
        assert!(ctrl(&mut input, 'k'));
        assert_eq!(input.text(), "");
        assert!(!ctrl(&mut input, 'u'));
    }

    #[test]
    fn test_alt_word_motion() {
        let mut input = TextInput::with_text("one two three");
        input.handle_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT));
        assert_eq!(input.cursor_position(), 8);
        input.handle_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT));
        assert_eq!(input.cursor_position(), 4);
        input.handle_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::ALT));
        assert_eq!(input.cursor_position(), 8);
    }

    #[test]
    fn test_masked_rendering_hides_text() {
        let input = TextInput::with_text("hunter2");
        let rendered: String = input
            .render_cursor_spans(true)
            .iter()
            .map(|span| span.content.to_string())
            .collect();
        assert!(!rendered.contains("hunter2"));
        assert_eq!(rendered.chars().count(), 8);
    }

    #[test]
    fn test_take_empties_input() {
        let mut input = TextInput::with_text("query");
        assert_eq!(input.take(), "query");
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor_position(), 0);
    }
}
