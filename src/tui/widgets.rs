//! Minimal interactive widget state: a selectable list and a one-line text
//! input. State lives in the app; rendering happens in the app's view.

use crossterm::event::{KeyCode, KeyEvent};

/// Selection and scroll offset of a vertical list.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    selected: Option<usize>,
    offset: usize,
}

impl ListState {
    pub fn with_selection() -> Self {
        Self {
            selected: Some(0),
            offset: 0,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Move the selection for a navigation key and keep it inside the
    /// visible window.
    pub fn handle_key(&mut self, key: KeyCode, len: usize, visible_height: usize) {
        if len == 0 {
            self.selected = None;
            self.offset = 0;
            return;
        }
        let current = self.selected.unwrap_or(0).min(len - 1);
        let next = match key {
            KeyCode::Up | KeyCode::Char('k') => current.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => (current + 1).min(len - 1),
            KeyCode::PageUp => current.saturating_sub(visible_height.max(1)),
            KeyCode::PageDown => (current + visible_height.max(1)).min(len - 1),
            KeyCode::Home => 0,
            KeyCode::End => len - 1,
            _ => current,
        };
        self.selected = Some(next);

        // Keep the selection in view.
        if next < self.offset {
            self.offset = next;
        } else if visible_height > 0 && next >= self.offset + visible_height {
            self.offset = next + 1 - visible_height;
        }
    }
}

/// A single-line editable text buffer with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    value: String,
    cursor: usize,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an editing key. Returns true when the buffer content changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let char_count = self.value.chars().count();
        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let at = self.byte_index(self.cursor - 1);
                    self.value.remove(at);
                    self.cursor -= 1;
                    true
                } else {
                    false
                }
            }
            KeyCode::Delete => {
                if self.cursor < char_count {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(char_count);
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = char_count;
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn list_selection_stays_in_window() {
        let mut list = ListState::with_selection();
        for _ in 0..6 {
            list.handle_key(KeyCode::Down, 10, 4);
        }
        assert_eq!(list.selected(), Some(6));
        assert_eq!(list.offset(), 3);

        list.handle_key(KeyCode::Home, 10, 4);
        assert_eq!(list.selected(), Some(0));
        assert_eq!(list.offset(), 0);
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInputState::with_value("ab");
        input.handle_key(press(KeyCode::Left));
        assert!(input.handle_key(press(KeyCode::Char('x'))));
        assert_eq!(input.value(), "axb");

        assert!(input.handle_key(press(KeyCode::Backspace)));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn text_input_handles_multibyte_chars() {
        let mut input = TextInputState::with_value("İnş");
        input.handle_key(press(KeyCode::Char('a')));
        assert_eq!(input.value(), "İnşa");
        input.handle_key(press(KeyCode::Backspace));
        input.handle_key(press(KeyCode::Backspace));
        assert_eq!(input.value(), "İn");
    }
}
