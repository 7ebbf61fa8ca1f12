use super::app_state::AppState;
use super::components::{
    Component,
    chat_view::ChatView,
    help_dialog::HelpDialog,
    input_overlay::{CredentialsDialog, SearchBar},
    list_viewer::{ListRow, ListViewer},
    metrics_panel::MetricsPanel,
    modal::Modal,
    rows::{EntryRow, PickerRow},
    text_panel::TextPanel,
    view_layout::{Styles, ViewLayout, centered_rect},
};
use crate::backend::SignalType;
use crate::interactive::constants::MODAL_MARGIN;
use crate::interactive::domain::models::{RequestKind, ViewMode};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::Clear,
};
use std::time::Instant;

/// Draws the current screen and, when an overlay is active, the overlay on
/// top of it. Holds only per-list scroll offsets between frames.
pub struct Renderer {
    entries: ListViewer,
    metric_docs: ListViewer,
    transactions: ListViewer,
    metrics: ListViewer,
    picker: ListViewer,
    perspective: ListViewer,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            entries: ListViewer::new("Entries", "No entries in this time range"),
            metric_docs: ListViewer::new("Documents", "No documents for this metric"),
            transactions: ListViewer::new("Transactions", "No transactions in this time range"),
            metrics: ListViewer::new("Metrics", "No metrics in this time range"),
            picker: ListViewer::new("Select", "Nothing to choose from"),
            perspective: ListViewer::new("Perspective", "Nothing to group by"),
        }
    }

    pub fn render(&mut self, f: &mut Frame, state: &AppState) {
        let screen = state.views.screen();
        let current = state.views.current();

        let (status, status_style) = Self::footer(state, current);
        let layout = ViewLayout::new(Self::title(state))
            .with_subtitle(state.filters.summary())
            .with_status_text(status)
            .with_status_style(status_style);

        let mut body = Rect::default();
        layout.render(f, f.area(), |f, area| {
            body = area;
            self.render_screen(f, area, state, screen);
        });

        if current != screen {
            self.render_overlay(f, body, state, current);
        }
    }

    fn title(state: &AppState) -> String {
        let tabs: Vec<String> = [SignalType::Logs, SignalType::Traces, SignalType::Metrics]
            .into_iter()
            .map(|signal| {
                if signal == state.signal {
                    format!("[{}]", signal.label())
                } else {
                    signal.label().to_string()
                }
            })
            .collect();
        let refresh = if state.auto_refresh { "auto" } else { "paused" };
        format!(
            "obsterm  {}  ·  {}  ·  refresh {refresh}",
            tabs.join(" "),
            state.settings.backend_name
        )
    }

    fn footer(state: &AppState, current: ViewMode) -> (String, ratatui::style::Style) {
        if let Some(status) = &state.status {
            return (status.text.clone(), Styles::success());
        }
        if let Some(loading) = state.loading_summary(Instant::now()) {
            return (loading, Styles::warning());
        }
        (Self::hints(current).to_string(), Styles::dimmed())
    }

    fn hints(mode: ViewMode) -> &'static str {
        match mode {
            ViewMode::EntryList => {
                "j/k: Move | Enter: Detail | /: Search | l: Level | t: Time | p: Group | Tab: Signal | ?: Help | q: Quit"
            }
            ViewMode::Detail | ViewMode::DetailRaw => {
                "j/k: Scroll | n/N: Next/Prev | v: Raw | y: Copy | o: Open | Esc: Back"
            }
            ViewMode::TransactionNames => {
                "j/k: Move | Enter: Spans | /: Search | t: Time | Tab: Signal | ?: Help | q: Quit"
            }
            ViewMode::MetricsDashboard => {
                "j/k: Move | Enter: Documents | t: Time | O: Collector | Tab: Signal | ?: Help"
            }
            ViewMode::MetricDetail => "j/k: Move | Enter: Detail | Esc: Back",
            ViewMode::Chat => "Enter: Send | PgUp/PgDn: Scroll | Esc: Close",
            ViewMode::IndexPicker | ViewMode::FieldPicker => "j/k: Move | Enter/Space: Select | Esc: Close",
            ViewMode::PerspectiveList => "+: Include | -: Exclude | Tab: Services/Resources | Esc: Close",
            _ => "Esc: Back",
        }
    }

    fn render_screen(&mut self, f: &mut Frame, area: Rect, state: &AppState, screen: ViewMode) {
        match screen {
            ViewMode::EntryList => {
                let title = match &state.filters.transaction {
                    Some(transaction) => format!("Spans · {transaction}"),
                    None => format!("Entries · {} total", state.entries_total),
                };
                self.entries.set_title(title);
                let rows = entry_rows(&state.entries.items, &state.visible_fields);
                self.entries
                    .render(f, area, &rows, state.entries.selection.selected());
            }
            ViewMode::Detail | ViewMode::DetailRaw => {
                TextPanel::from_strings(screen.title(), &state.detail.lines)
                    .with_scroll(state.detail.scroll)
                    .render(f, area);
            }
            ViewMode::TransactionNames => {
                self.transactions.render(
                    f,
                    area,
                    &state.transactions.items,
                    state.transactions.selection.selected(),
                );
            }
            ViewMode::MetricsDashboard => {
                let chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(area);
                self.metrics.render(
                    f,
                    chunks[0],
                    &state.metrics.items,
                    state.metrics.selection.selected(),
                );
                MetricsPanel::new(state.metrics.selected_item()).render(f, chunks[1]);
            }
            ViewMode::MetricDetail => {
                let metric = state.selected_metric.as_deref().unwrap_or("-");
                self.metric_docs.set_title(format!("Documents · {metric}"));
                let rows = entry_rows(&state.metric_docs.items, &[]);
                self.metric_docs
                    .render(f, area, &rows, state.metric_docs.selection.selected());
            }
            ViewMode::Chat => {
                ChatView::new(&state.chat.messages, &state.chat.input)
                    .with_scroll_back(state.chat.scroll_back)
                    .with_waiting(state.is_loading(RequestKind::Chat))
                    .render(f, area);
            }
            _ => {}
        }
    }

    fn render_overlay(&mut self, f: &mut Frame, body: Rect, state: &AppState, overlay: ViewMode) {
        match overlay {
            ViewMode::SearchInput => SearchBar::new(&state.search_input).render(f, body),
            ViewMode::IndexPicker => {
                let rows: Vec<PickerRow> = state
                    .settings
                    .indices
                    .iter()
                    .map(|index| PickerRow {
                        label: index.clone(),
                        detail: None,
                        marked: *index == state.filters.index,
                    })
                    .collect();
                self.picker.set_title("Select index");
                self.picker.empty_message = "The backend offered no indices".to_string();
                render_popup_list(&mut self.picker, f, body, &rows, state.index_picker.selected());
            }
            ViewMode::FieldPicker => {
                let rows: Vec<PickerRow> = state
                    .fields
                    .items
                    .iter()
                    .map(|field| PickerRow {
                        label: field.name.clone(),
                        detail: Some(field.field_type.clone()),
                        marked: state.visible_fields.contains(&field.name),
                    })
                    .collect();
                self.picker.set_title("Columns");
                self.picker.empty_message = if state.is_loading(RequestKind::FieldMetadata) {
                    "Loading fields…".to_string()
                } else {
                    "No fields found".to_string()
                };
                render_popup_list(&mut self.picker, f, body, &rows, state.fields.selection.selected());
            }
            ViewMode::PerspectiveList => {
                self.perspective
                    .set_title(format!("By {}", state.perspective.kind.label()));
                self.perspective.empty_message = if state.is_loading(RequestKind::PerspectiveRollup) {
                    "Loading…".to_string()
                } else {
                    "Nothing to group by".to_string()
                };
                render_popup_list(
                    &mut self.perspective,
                    f,
                    body,
                    &state.perspective.items.items,
                    state.perspective.items.selection.selected(),
                );
            }
            ViewMode::ErrorModal => {
                let lines = state.modal_lines();
                Modal::from_strings(" Error ", &lines)
                    .with_scroll(state.modal_scroll)
                    .with_border_style(Styles::error())
                    .render(f, body);
            }
            ViewMode::QueryOverlay | ViewMode::CollectorConfig(_) => {
                let lines = state.modal_lines();
                Modal::from_strings(format!(" {} ", overlay.title()), &lines)
                    .with_scroll(state.modal_scroll)
                    .render(f, body);
            }
            ViewMode::Help => HelpDialog::new(state.modal_scroll).render(f, body),
            ViewMode::QuitConfirm => {
                Modal::new(" Quit ", vec![Line::raw("Quit obsterm?")])
                    .with_hint("y/Enter: Quit | any other key: Stay")
                    .with_border_style(Styles::warning())
                    .render(f, body);
            }
            ViewMode::Credentials => CredentialsDialog::new(&state.credentials).render(f, body),
            _ => {}
        }
    }
}

fn entry_rows<'a>(
    entries: &'a [crate::backend::LogEntry],
    columns: &'a [String],
) -> Vec<EntryRow<'a>> {
    entries
        .iter()
        .map(|entry| EntryRow { entry, columns })
        .collect()
}

fn render_popup_list<T: ListRow>(
    viewer: &mut ListViewer,
    f: &mut Frame,
    body: Rect,
    items: &[T],
    selected: usize,
) {
    let height = u16::try_from(items.len().max(1) + 2).unwrap_or(u16::MAX);
    let area = centered_rect(body, 70, height, MODAL_MARGIN / 2);
    f.render_widget(Clear, area);
    viewer.render(f, area, items, selected);
}
