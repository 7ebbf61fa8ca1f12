pub mod chat_view;
pub mod help_dialog;
pub mod input_overlay;
pub mod list_viewer;
pub mod metrics_panel;
pub mod modal;
pub mod rows;
pub mod text_input;
pub mod text_panel;
pub mod view_layout;

#[cfg(test)]
mod view_layout_test;

use ratatui::{Frame, layout::Rect};

/// A drawable piece of the screen. Key handling lives in the keymap, so
/// components only render.
pub trait Component {
    fn render(&mut self, f: &mut Frame, area: Rect);
}
