use crate::interactive::domain::models::SortOrder;

/// Cursor over a result list with tail-follow tracking.
///
/// `selected` stays inside `[0, len - 1]`, and is 0 for an empty list.
/// Manual moves set `user_has_scrolled`, which suppresses tail-follow
/// until [`SelectionModel::reset_follow`] is called.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: usize,
    user_has_scrolled: bool,
    len: usize,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn user_has_scrolled(&self) -> bool {
        self.user_has_scrolled
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.len.saturating_sub(1))
    }

    /// Manual selection. Returns whether the index actually changed.
    pub fn set_selected_index(&mut self, index: usize) -> bool {
        let clamped = self.clamp(index);
        if clamped == self.selected {
            return false;
        }
        self.selected = clamped;
        self.user_has_scrolled = true;
        true
    }

    pub fn move_selection(&mut self, delta: isize) -> bool {
        let target = self.selected.saturating_add_signed(delta);
        self.set_selected_index(target)
    }

    pub fn select_first(&mut self) -> bool {
        self.set_selected_index(0)
    }

    pub fn select_last(&mut self) -> bool {
        self.set_selected_index(self.len.saturating_sub(1))
    }

    /// New list length without a refresh. Only clamps.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.selected = self.clamp(self.selected);
    }

    /// Apply a refreshed list: clamp, then follow the newest item unless
    /// the user has moved the cursor.
    pub fn apply_refresh(&mut self, len: usize, order: SortOrder) {
        self.set_len(len);
        if self.user_has_scrolled || len == 0 {
            return;
        }
        self.selected = match order {
            SortOrder::NewestFirst => 0,
            SortOrder::OldestFirst => len - 1,
        };
    }

    /// Re-enable tail-follow after the filter set changed.
    pub fn reset_follow(&mut self) {
        self.user_has_scrolled = false;
    }

    /// Forget everything, e.g. when the list it tracked is discarded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
