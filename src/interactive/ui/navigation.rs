use crate::interactive::domain::models::ViewMode;

/// One saved ancestor of the active view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewStackFrame {
    pub mode: ViewMode,
}

/// The active view plus the chain of views it was opened from.
///
/// The frames hold only ancestors: `push` saves the current mode before
/// switching, `pop` restores the most recent one. Together they always
/// describe a path from a base view through zero or more nested views.
#[derive(Clone, Debug)]
pub struct ViewStack {
    current: ViewMode,
    frames: Vec<ViewStackFrame>,
}

impl ViewStack {
    pub fn new(base: ViewMode) -> Self {
        Self {
            current: base,
            frames: Vec::new(),
        }
    }

    pub fn current(&self) -> ViewMode {
        self.current
    }

    pub fn push(&mut self, mode: ViewMode) {
        self.frames.push(ViewStackFrame {
            mode: self.current,
        });
        self.current = mode;
    }

    /// Restore the previous view. Returns false, leaving the current view
    /// alone, when there is nothing to go back to.
    pub fn pop(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                self.current = frame.mode;
                true
            }
            None => false,
        }
    }

    /// The view that was active before the current one, or the current
    /// view when nothing is stacked.
    pub fn peek(&self) -> ViewMode {
        self.frames
            .last()
            .map(|frame| frame.mode)
            .unwrap_or(self.current)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Lateral move between base views. History is dropped.
    pub fn set_base(&mut self, base: ViewMode) {
        debug_assert!(base.is_base(), "{base:?} cannot be a base view");
        self.frames.clear();
        self.current = base;
    }

    /// Bottom of the path.
    pub fn base(&self) -> ViewMode {
        self.frames
            .first()
            .map(|frame| frame.mode)
            .unwrap_or(self.current)
    }

    /// Whether `mode` is active or anywhere beneath it.
    pub fn contains(&self, mode: ViewMode) -> bool {
        self.current == mode || self.frames.iter().any(|frame| frame.mode == mode)
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Topmost view that is not an overlay. Overlays render on top of it.
    pub fn screen(&self) -> ViewMode {
        if !self.current.is_overlay() {
            return self.current;
        }
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.mode)
            .find(|mode| !mode.is_overlay())
            .unwrap_or(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_pop_restores_previous_mode() {
        for start in ViewMode::ALL {
            for next in ViewMode::ALL {
                let mut stack = ViewStack::new(start);
                stack.push(next);
                assert_eq!(stack.current(), next);
                assert!(stack.pop());
                assert_eq!(stack.current(), start, "push {next:?} from {start:?}");
                assert_eq!(stack.depth(), 0);
            }
        }
    }

    #[test]
    fn test_pop_on_empty_stack_is_noop() {
        let mut stack = ViewStack::new(ViewMode::MetricsDashboard);
        assert!(!stack.pop());
        assert_eq!(stack.current(), ViewMode::MetricsDashboard);
    }

    #[test]
    fn test_peek_shows_background() {
        let mut stack = ViewStack::new(ViewMode::EntryList);
        assert_eq!(stack.peek(), ViewMode::EntryList);
        stack.push(ViewMode::Detail);
        stack.push(ViewMode::ErrorModal);
        assert_eq!(stack.peek(), ViewMode::Detail);
        assert_eq!(stack.current(), ViewMode::ErrorModal);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_screen_skips_overlays() {
        let mut stack = ViewStack::new(ViewMode::TransactionNames);
        stack.push(ViewMode::EntryList);
        stack.push(ViewMode::FieldPicker);
        stack.push(ViewMode::ErrorModal);
        assert_eq!(stack.screen(), ViewMode::EntryList);
        assert_eq!(stack.base(), ViewMode::TransactionNames);
        assert!(stack.contains(ViewMode::FieldPicker));
        assert!(!stack.contains(ViewMode::Help));
    }

    #[test]
    fn test_set_base_clears_history() {
        let mut stack = ViewStack::new(ViewMode::EntryList);
        stack.push(ViewMode::Detail);
        stack.push(ViewMode::DetailRaw);
        stack.set_base(ViewMode::MetricsDashboard);
        assert_eq!(stack.current(), ViewMode::MetricsDashboard);
        assert_eq!(stack.depth(), 0);
        assert!(!stack.pop());
    }

    #[test]
    fn test_chat_is_pushed_above_the_base() {
        let mut stack = ViewStack::new(ViewMode::MetricsDashboard);
        stack.push(ViewMode::Chat);
        stack.push(ViewMode::Help);
        assert_eq!(stack.screen(), ViewMode::Chat);
        assert_eq!(stack.base(), ViewMode::MetricsDashboard);
    }

    #[test]
    fn test_clear_keeps_current() {
        let mut stack = ViewStack::new(ViewMode::EntryList);
        stack.push(ViewMode::Help);
        stack.clear();
        assert_eq!(stack.current(), ViewMode::Help);
        assert!(!stack.pop());
    }
}
