use unicode_segmentation::UnicodeSegmentation;

use crate::toggles::ToggleGroup;

const TITLE_LIMIT: usize = 300;

/// Which draft field the reviewer is typing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Notes,
    Tags,
}

/// Grapheme-aware single or multi-line input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    buffer: String,
    cursor: usize,
    multiline: bool,
    limit: Option<usize>,
}

impl TextField {
    pub fn single_line(text: &str) -> Self {
        Self {
            cursor: text.len(),
            buffer: text.to_string(),
            multiline: false,
            limit: None,
        }
    }

    pub fn multi_line(text: &str) -> Self {
        Self {
            multiline: true,
            ..Self::single_line(text)
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' && !self.multiline {
            return false;
        }
        if let Some(limit) = self.limit {
            if self.buffer.graphemes(true).count() >= limit {
                return false;
            }
        }
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.buffer.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_char('\n')
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.buffer, self.cursor);
        let moved = self.cursor != start;
        self.cursor = start;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.buffer, self.cursor);
        let moved = self.cursor != end;
        self.cursor = end;
        moved
    }

    pub fn move_word_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut idx = self.cursor;
        while idx > 0 {
            let prev = prev_grapheme_boundary(&self.buffer, idx);
            if !self.buffer[prev..idx].trim().is_empty() {
                break;
            }
            idx = prev;
        }
        while idx > 0 {
            let prev = prev_grapheme_boundary(&self.buffer, idx);
            if self.buffer[prev..idx].trim().is_empty() {
                break;
            }
            idx = prev;
        }
        self.cursor = idx;
        true
    }

    pub fn move_word_right(&mut self) -> bool {
        let len = self.buffer.len();
        if self.cursor >= len {
            return false;
        }
        let mut idx = self.cursor;
        while idx < len {
            let next = next_grapheme_boundary(&self.buffer, idx);
            if self.buffer[idx..next].trim().is_empty() {
                break;
            }
            idx = next;
        }
        while idx < len {
            let next = next_grapheme_boundary(&self.buffer, idx);
            if !self.buffer[idx..next].trim().is_empty() {
                break;
            }
            idx = next;
        }
        self.cursor = idx;
        true
    }

    /// Text before the cursor, used to place the terminal cursor.
    pub fn before_cursor(&self) -> &str {
        &self.buffer[..self.cursor.min(self.buffer.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    Search(TextField),
    RenameTitle { id: i64, field: TextField },
    NewItem(TextField),
    ConfirmDelete { id: i64, title: String },
    Alert { title: String, message: String },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub focus: ToggleGroup,
    overlay: Option<OverlayState>,
    editing: Option<(EditTarget, TextField)>,
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            focus: ToggleGroup::Tags,
            overlay: None,
            editing: None,
            status_message: None,
        }
    }
}

impl AppState {
    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.other();
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) -> Option<OverlayState> {
        self.overlay.take()
    }

    pub fn open_search(&mut self, current: &str) {
        self.overlay = Some(OverlayState::Search(TextField::single_line(current)));
    }

    pub fn open_rename(&mut self, id: i64, title: &str) {
        self.overlay = Some(OverlayState::RenameTitle {
            id,
            field: TextField::single_line(title).with_limit(TITLE_LIMIT),
        });
    }

    pub fn open_new_item(&mut self) {
        self.overlay = Some(OverlayState::NewItem(
            TextField::default().with_limit(TITLE_LIMIT),
        ));
    }

    pub fn open_confirm_delete(&mut self, id: i64, title: &str) {
        self.overlay = Some(OverlayState::ConfirmDelete {
            id,
            title: title.to_string(),
        });
    }

    /// Blocking message; replaces whatever overlay is open.
    pub fn show_alert(&mut self, title: &str, message: impl Into<String>) {
        self.overlay = Some(OverlayState::Alert {
            title: title.to_string(),
            message: message.into(),
        });
    }

    /// The text input of the open overlay, if it has one.
    pub fn overlay_field_mut(&mut self) -> Option<&mut TextField> {
        match self.overlay.as_mut()? {
            OverlayState::Search(field) | OverlayState::NewItem(field) => Some(field),
            OverlayState::RenameTitle { field, .. } => Some(field),
            OverlayState::ConfirmDelete { .. } | OverlayState::Alert { .. } => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<(EditTarget, &TextField)> {
        self.editing.as_ref().map(|(target, field)| (*target, field))
    }

    pub fn begin_edit(&mut self, target: EditTarget, text: &str) {
        let field = match target {
            EditTarget::Notes => TextField::multi_line(text),
            EditTarget::Tags => TextField::single_line(text),
        };
        self.editing = Some((target, field));
    }

    pub fn edit_field_mut(&mut self) -> Option<&mut TextField> {
        self.editing.as_mut().map(|(_, field)| field)
    }

    pub fn finish_edit(&mut self) -> Option<(EditTarget, String)> {
        self.editing
            .take()
            .map(|(target, field)| (target, field.buffer))
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut field = TextField::single_line("café👍🏽");
        assert!(field.backspace());
        assert_eq!(field.buffer(), "café");
        assert!(field.backspace());
        assert_eq!(field.buffer(), "caf");
    }

    #[test]
    fn single_line_rejects_newlines() {
        let mut field = TextField::single_line("ai");
        assert!(!field.insert_newline());
        let mut notes = TextField::multi_line("first");
        assert!(notes.insert_newline());
        assert!(notes.insert_char('x'));
        assert_eq!(notes.buffer(), "first\nx");
        assert!(notes.move_home());
        assert_eq!(notes.before_cursor(), "first\n");
    }

    #[test]
    fn insert_in_the_middle() {
        let mut field = TextField::single_line("ac");
        field.move_left();
        field.insert_char('b');
        assert_eq!(field.buffer(), "abc");
        assert_eq!(field.cursor(), 2);
        assert!(field.delete());
        assert_eq!(field.buffer(), "ab");
        assert!(!field.delete());
    }

    #[test]
    fn word_jumps_skip_whitespace() {
        let mut field = TextField::single_line("alpha  beta");
        assert!(field.move_word_left());
        assert_eq!(field.cursor(), 7);
        assert!(field.move_word_left());
        assert_eq!(field.cursor(), 0);
        assert!(field.move_word_right());
        assert_eq!(field.cursor(), 7);
    }

    #[test]
    fn limit_caps_graphemes() {
        let mut field = TextField::default().with_limit(2);
        assert!(field.insert_char('a'));
        assert!(field.insert_char('b'));
        assert!(!field.insert_char('c'));
        assert_eq!(field.buffer(), "ab");
    }

    #[test]
    fn overlays_expose_their_input() {
        let mut state = AppState::default();
        state.open_rename(4, "Old");
        state
            .overlay_field_mut()
            .expect("rename field")
            .insert_char('!');
        assert_matches!(
            state.overlay(),
            Some(OverlayState::RenameTitle { id: 4, field }) if field.buffer() == "Old!"
        );

        state.open_confirm_delete(4, "Old!");
        assert!(state.overlay_field_mut().is_none());
        state.show_alert("Save failed", "boom");
        assert_matches!(state.close_overlay(), Some(OverlayState::Alert { .. }));
        assert!(state.overlay().is_none());
    }

    #[test]
    fn editing_returns_final_text() {
        let mut state = AppState::default();
        state.begin_edit(EditTarget::Tags, "ai");
        if let Some(field) = state.edit_field_mut() {
            field.insert_char(',');
            field.insert_char(' ');
            field.insert_char('x');
        }
        assert_eq!(
            state.finish_edit(),
            Some((EditTarget::Tags, "ai, x".to_string()))
        );
        assert!(!state.is_editing());
    }

    #[test]
    fn focus_alternates_between_rows() {
        let mut state = AppState::default();
        state.toggle_focus();
        assert_eq!(state.focus, ToggleGroup::People);
        state.toggle_focus();
        assert_eq!(state.focus, ToggleGroup::Tags);
    }
}
