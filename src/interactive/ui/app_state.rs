use super::commands::Command;
use super::components::text_input::TextInput;
use super::content;
use super::events::{Action, Message};
use super::keymap;
use super::navigation::ViewStack;
use super::selection::SelectionModel;
use crate::backend::*;
use crate::config::{Config, Timeouts};
use crate::interactive::application::fetch_service::{
    FetchJob, FetchPayload, FetchRequest, FetchResult,
};
use crate::interactive::application::outbound::expand_url_template;
use crate::interactive::application::request_tracker::RequestTracker;
use crate::interactive::constants::*;
use crate::interactive::domain::filter::FilterState;
use crate::interactive::domain::models::{RequestKind, ViewMode, base_view};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Values fixed for the lifetime of the session.
#[derive(Clone, Debug)]
pub struct Settings {
    pub backend_name: String,
    pub indices: Vec<String>,
    pub refresh_interval: Duration,
    pub page_size: usize,
    pub timeouts: Timeouts,
    pub web_url: Option<String>,
    pub collector_endpoint: String,
}

impl Settings {
    pub fn from_config(config: &Config, backend_name: impl Into<String>, indices: Vec<String>) -> Self {
        Self {
            backend_name: backend_name.into(),
            indices,
            refresh_interval: config.refresh_interval,
            page_size: config.page_size,
            timeouts: config.timeouts.clone(),
            web_url: config.web_url.clone(),
            collector_endpoint: config.collector_endpoint.clone(),
        }
    }
}

/// A cached payload list and the cursor over it.
#[derive(Clone, Debug)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub selection: SelectionModel,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selection: SelectionModel::new(),
        }
    }
}

impl<T> ListState<T> {
    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selection.selected())
    }

    /// Replace the items, keeping the cursor in bounds.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.selection.set_len(self.items.len());
    }

    /// Replace the items and tail-follow the newest one.
    pub fn replace_following(&mut self, items: Vec<T>, order: SortOrder) {
        self.items = items;
        self.selection.apply_refresh(self.items.len(), order);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selection.reset();
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpanState {
    pub spans: Vec<Span>,
    /// Trace the cached (or in-flight) spans belong to.
    pub last_trace_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PerspectiveState {
    pub kind: PerspectiveKind,
    pub items: ListState<PerspectiveItem>,
}

#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub input: TextInput,
    /// Lines scrolled up from the newest message.
    pub scroll_back: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialField {
    #[default]
    Username,
    Secret,
}

#[derive(Clone, Debug, Default)]
pub struct CredentialsForm {
    pub username: TextInput,
    pub secret: TextInput,
    pub focus: CredentialField,
}

impl CredentialsForm {
    fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            CredentialField::Username => &mut self.username,
            CredentialField::Secret => &mut self.secret,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DetailState {
    /// List the detail was opened from.
    pub origin: ViewMode,
    pub lines: Vec<String>,
    pub scroll: usize,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            origin: ViewMode::EntryList,
            lines: Vec::new(),
            scroll: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub shown_at: Instant,
}

/// Everything the event loop owns. Only [`AppState::update`] mutates it,
/// one message at a time.
pub struct AppState {
    pub settings: Settings,
    pub signal: SignalType,
    pub views: ViewStack,
    pub filters: FilterState,
    pub auto_refresh: bool,
    pub requests: RequestTracker,
    pub loading: HashMap<RequestKind, Instant>,

    pub entries: ListState<LogEntry>,
    pub entries_total: u64,
    pub metrics: ListState<MetricSeries>,
    pub metric_docs: ListState<LogEntry>,
    pub selected_metric: Option<String>,
    pub transactions: ListState<TransactionSummary>,
    pub spans: SpanState,
    pub fields: ListState<FieldInfo>,
    pub visible_fields: Vec<String>,
    pub index_picker: SelectionModel,
    pub perspective: PerspectiveState,
    pub chat: ChatState,

    pub search_input: TextInput,
    pub credentials: CredentialsForm,
    pub detail: DetailState,
    pub modal_scroll: usize,
    pub error: Option<String>,
    pub status: Option<StatusMessage>,
    pub last_query_repr: String,
    pub viewport: (u16, u16),
}

impl AppState {
    pub fn new(config: &Config, settings: Settings) -> Self {
        let index = config
            .index
            .clone()
            .or_else(|| settings.indices.first().cloned())
            .unwrap_or_default();
        let filters = FilterState {
            lookback: config.lookback,
            sort: config.sort,
            index,
            ..FilterState::default()
        };

        Self {
            signal: config.signal,
            views: ViewStack::new(base_view(config.signal)),
            filters,
            auto_refresh: config.auto_refresh,
            requests: RequestTracker::new(),
            loading: HashMap::new(),
            entries: ListState::default(),
            entries_total: 0,
            metrics: ListState::default(),
            metric_docs: ListState::default(),
            selected_metric: None,
            transactions: ListState::default(),
            spans: SpanState::default(),
            fields: ListState::default(),
            visible_fields: Vec::new(),
            index_picker: SelectionModel::new(),
            perspective: PerspectiveState::default(),
            chat: ChatState::default(),
            search_input: TextInput::new(),
            credentials: CredentialsForm::default(),
            detail: DetailState::default(),
            modal_scroll: 0,
            error: None,
            status: None,
            last_query_repr: String::new(),
            viewport: (80, 24),
            settings,
        }
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Key(key) => match keymap::map_key(self.views.current(), key) {
                Some(action) => self.handle_action(action),
                None => Command::None,
            },
            Message::Mouse(mouse) => match keymap::map_mouse(self.views.current(), mouse) {
                Some(action) => self.handle_action(action),
                None => Command::None,
            },
            Message::Resize(width, height) => {
                self.viewport = (width, height);
                self.refresh_detail();
                Command::None
            }
            Message::Start => {
                info!(
                    backend = %self.settings.backend_name,
                    signal = self.signal.label(),
                    index = %self.filters.index,
                    "session started"
                );
                Command::batch([
                    self.start_auto_detect(),
                    Command::ScheduleTick(self.settings.refresh_interval),
                ])
            }
            Message::Tick => self.on_tick(),
            Message::Redraw => {
                self.expire_status(Instant::now());
                Command::None
            }
            Message::FetchCompleted(result) => self.handle_fetch_result(result),
            Message::Action(action) => self.handle_action(action),
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Command {
        match action {
            Action::MoveSelection(delta) => self.change_selection(|s| s.move_selection(delta)),
            Action::SelectFirst => self.change_selection(SelectionModel::select_first),
            Action::SelectLast => self.change_selection(SelectionModel::select_last),
            Action::ScrollContent(delta) => {
                self.scroll_content(delta);
                Command::None
            }
            Action::Back => self.go_back(),
            Action::Activate => self.activate(),
            Action::ToggleRaw => {
                self.toggle_raw();
                Command::None
            }
            Action::NextSignal => self.switch_signal(self.signal.next()),
            Action::ShowHelp => {
                self.modal_scroll = 0;
                self.open(ViewMode::Help);
                Command::None
            }
            Action::OpenChat => {
                self.open(ViewMode::Chat);
                Command::None
            }
            Action::OpenSearch => {
                self.search_input.set_text(self.filters.query.clone());
                self.open(ViewMode::SearchInput);
                Command::None
            }
            Action::EditInput(key) => {
                match self.views.current() {
                    ViewMode::SearchInput => {
                        self.search_input.handle_key(key);
                    }
                    ViewMode::Chat => {
                        self.chat.input.handle_key(key);
                    }
                    ViewMode::Credentials => {
                        self.credentials.focused_mut().handle_key(key);
                    }
                    _ => {}
                }
                Command::None
            }
            Action::SubmitInput => self.submit_input(),
            Action::SwitchCredentialField => {
                self.credentials.focus = match self.credentials.focus {
                    CredentialField::Username => CredentialField::Secret,
                    CredentialField::Secret => CredentialField::Username,
                };
                Command::None
            }
            Action::CycleLevel => {
                self.filters.level = self.filters.level.next();
                self.set_status(format!("Level: {}", self.filters.level.label()));
                self.filters_changed()
            }
            Action::CycleLookback => {
                self.filters.lookback = self.filters.lookback.next_preset();
                self.set_status(format!("Lookback: last {}", self.filters.lookback));
                self.filters_changed()
            }
            Action::ToggleSort => {
                self.filters.sort = self.filters.sort.toggled();
                self.set_status(format!("Sort: {}", self.filters.sort.label()));
                self.filters_changed()
            }
            Action::ClearFieldFilters => {
                if self.filters.clear_field_filters() {
                    self.set_status("Field filters cleared");
                    self.filters_changed()
                } else {
                    Command::None
                }
            }
            Action::ApplyPerspective(polarity) => self.apply_perspective(polarity),
            Action::TogglePerspectiveKind => {
                self.perspective.kind = self.perspective.kind.next();
                self.perspective.items.clear();
                self.fetch_perspective()
            }
            Action::ToggleAutoRefresh => {
                self.auto_refresh = !self.auto_refresh;
                let state = if self.auto_refresh { "on" } else { "off" };
                self.set_status(format!("Auto-refresh {state}"));
                Command::None
            }
            Action::Refresh => self.fetch_primary(),
            Action::OpenIndexPicker => {
                self.index_picker.set_len(self.settings.indices.len());
                let current = self
                    .settings
                    .indices
                    .iter()
                    .position(|index| *index == self.filters.index)
                    .unwrap_or(0);
                self.index_picker.set_selected_index(current);
                self.open(ViewMode::IndexPicker);
                Command::None
            }
            Action::OpenFieldPicker => {
                self.open(ViewMode::FieldPicker);
                if self.fields.items.is_empty() && !self.requests.in_flight(RequestKind::FieldMetadata)
                {
                    self.fetch_fields()
                } else {
                    Command::None
                }
            }
            Action::OpenQueryOverlay => {
                self.modal_scroll = 0;
                self.open(ViewMode::QueryOverlay);
                Command::None
            }
            Action::OpenPerspectives => {
                if self.open(ViewMode::PerspectiveList) {
                    self.fetch_perspective()
                } else {
                    Command::None
                }
            }
            Action::OpenCredentials => {
                self.credentials.focus = CredentialField::Username;
                self.open(ViewMode::Credentials);
                Command::None
            }
            Action::OpenCollectorConfig => {
                self.modal_scroll = 0;
                self.open(ViewMode::CollectorConfig(self.signal));
                Command::None
            }
            Action::CopySelection => self.copy_selection(),
            Action::OpenInBrowser => self.open_in_browser(),
            Action::AskQuit => {
                self.open(ViewMode::QuitConfirm);
                Command::None
            }
            Action::ConfirmQuit | Action::Quit => {
                info!("quitting");
                self.requests.cancel_all();
                self.loading.clear();
                Command::Quit
            }
        }
    }

    // ---- navigation ----

    /// Push `mode` unless it is already on the path.
    fn open(&mut self, mode: ViewMode) -> bool {
        if self.views.contains(mode) {
            return false;
        }
        self.views.push(mode);
        true
    }

    fn go_back(&mut self) -> Command {
        let leaving = self.views.current();
        let returning_to = self.views.peek();
        if !self.views.pop() {
            return Command::None;
        }
        debug!(from = ?leaving, to = ?returning_to, "view closed");
        match leaving {
            ViewMode::ErrorModal => {
                self.error = None;
                self.modal_scroll = 0;
            }
            ViewMode::QueryOverlay | ViewMode::Help | ViewMode::CollectorConfig(_) => {
                self.modal_scroll = 0;
            }
            ViewMode::SearchInput => self.search_input.clear(),
            ViewMode::Credentials => self.credentials.secret.clear(),
            ViewMode::EntryList if self.filters.transaction.is_some() => {
                // Leaving a traces drill-down.
                self.filters.transaction = None;
                self.entries.clear();
            }
            ViewMode::MetricDetail => {
                self.selected_metric = None;
                self.metric_docs.clear();
            }
            _ => {}
        }
        Command::None
    }

    fn switch_signal(&mut self, signal: SignalType) -> Command {
        if self.signal == SignalType::Traces && signal != SignalType::Traces {
            self.spans = SpanState::default();
            self.filters.transaction = None;
        }
        self.signal = signal;
        self.views.set_base(base_view(signal));
        self.error = None;
        self.modal_scroll = 0;
        self.entries.clear();
        self.metric_docs.clear();
        self.selected_metric = None;
        self.transactions.clear();
        self.metrics.clear();
        self.fields.clear();
        info!(signal = signal.label(), "switched signal");
        self.start_auto_detect()
    }

    fn activate(&mut self) -> Command {
        match self.views.current() {
            ViewMode::EntryList => self.open_detail(ViewMode::EntryList),
            ViewMode::MetricDetail => self.open_detail(ViewMode::MetricDetail),
            ViewMode::TransactionNames => self.drill_into_transaction(),
            ViewMode::MetricsDashboard => self.open_metric_detail(),
            ViewMode::IndexPicker => self.select_index(),
            ViewMode::FieldPicker => {
                self.toggle_field();
                Command::None
            }
            ViewMode::PerspectiveList => self.apply_perspective(Polarity::Include),
            _ => Command::None,
        }
    }

    fn open_detail(&mut self, origin: ViewMode) -> Command {
        let has_item = match origin {
            ViewMode::MetricDetail => self.metric_docs.selected_item().is_some(),
            _ => self.entries.selected_item().is_some(),
        };
        if !has_item {
            return Command::None;
        }
        self.detail.origin = origin;
        self.detail.scroll = 0;
        self.open(ViewMode::Detail);
        self.refresh_detail();
        self.maybe_fetch_spans()
    }

    fn toggle_raw(&mut self) {
        let other = match self.views.current() {
            ViewMode::Detail => ViewMode::DetailRaw,
            ViewMode::DetailRaw => ViewMode::Detail,
            _ => return,
        };
        self.views.pop();
        self.views.push(other);
        self.detail.scroll = 0;
        self.refresh_detail();
    }

    fn drill_into_transaction(&mut self) -> Command {
        let Some(name) = self.transactions.selected_item().map(|t| t.name.clone()) else {
            return Command::None;
        };
        debug!(transaction = %name, "drilling into transaction");
        self.filters.transaction = Some(name);
        self.entries.clear();
        self.open(ViewMode::EntryList);
        self.fetch_entries()
    }

    fn open_metric_detail(&mut self) -> Command {
        let Some(name) = self.metrics.selected_item().map(|m| m.name.clone()) else {
            return Command::None;
        };
        self.selected_metric = Some(name);
        self.metric_docs.clear();
        self.open(ViewMode::MetricDetail);
        self.fetch_metric_docs()
    }

    fn select_index(&mut self) -> Command {
        let Some(index) = self.settings.indices.get(self.index_picker.selected()).cloned() else {
            return Command::None;
        };
        self.views.pop();
        if index == self.filters.index {
            return Command::None;
        }
        info!(%index, "switched index");
        self.filters.index = index;
        self.fields.clear();
        self.visible_fields.clear();
        self.filters_changed()
    }

    fn toggle_field(&mut self) {
        let Some(name) = self.fields.selected_item().map(|f| f.name.clone()) else {
            return;
        };
        if let Some(pos) = self.visible_fields.iter().position(|f| *f == name) {
            self.visible_fields.remove(pos);
        } else {
            self.visible_fields.push(name);
        }
    }

    fn apply_perspective(&mut self, polarity: Polarity) -> Command {
        if self.views.current() != ViewMode::PerspectiveList {
            return Command::None;
        }
        let Some(value) = self.perspective.items.selected_item().map(|i| i.value.clone()) else {
            return Command::None;
        };
        self.views.pop();
        let filter = FieldFilter {
            field: self.perspective.kind.field().to_string(),
            value,
            polarity,
        };
        self.set_status(format!("Filter: {filter}"));
        if self.filters.add_field_filter(filter) {
            self.filters_changed()
        } else {
            Command::None
        }
    }

    // ---- selection ----

    /// The list that navigation keys move in the current view.
    fn active_list(&self) -> Option<ViewMode> {
        match self.views.current() {
            ViewMode::Detail | ViewMode::DetailRaw => Some(self.detail.origin),
            mode @ (ViewMode::EntryList
            | ViewMode::TransactionNames
            | ViewMode::MetricsDashboard
            | ViewMode::MetricDetail
            | ViewMode::IndexPicker
            | ViewMode::FieldPicker
            | ViewMode::PerspectiveList) => Some(mode),
            _ => None,
        }
    }

    fn selection_mut(&mut self, list: ViewMode) -> Option<&mut SelectionModel> {
        match list {
            ViewMode::EntryList => Some(&mut self.entries.selection),
            ViewMode::TransactionNames => Some(&mut self.transactions.selection),
            ViewMode::MetricsDashboard => Some(&mut self.metrics.selection),
            ViewMode::MetricDetail => Some(&mut self.metric_docs.selection),
            ViewMode::IndexPicker => Some(&mut self.index_picker),
            ViewMode::FieldPicker => Some(&mut self.fields.selection),
            ViewMode::PerspectiveList => Some(&mut self.perspective.items.selection),
            _ => None,
        }
    }

    fn change_selection(&mut self, change: impl FnOnce(&mut SelectionModel) -> bool) -> Command {
        let Some(list) = self.active_list() else {
            return Command::None;
        };
        let changed = self.selection_mut(list).is_some_and(change);
        if !changed {
            return Command::None;
        }
        if matches!(self.views.current(), ViewMode::Detail | ViewMode::DetailRaw) {
            self.detail.scroll = 0;
            self.refresh_detail();
        }
        if list == ViewMode::EntryList {
            self.maybe_fetch_spans()
        } else {
            Command::None
        }
    }

    /// Record the detail view and copy/open actions work on.
    pub fn selected_record(&self) -> Option<&LogEntry> {
        let source = match self.views.screen() {
            ViewMode::Detail | ViewMode::DetailRaw => self.detail.origin,
            other => other,
        };
        match source {
            ViewMode::MetricDetail => self.metric_docs.selected_item(),
            _ => self.entries.selected_item(),
        }
    }

    /// Rebuild the cached detail lines, e.g. after the selection, the
    /// terminal width or the raw toggle changed.
    pub fn refresh_detail(&mut self) {
        let raw = match self.views.screen() {
            ViewMode::Detail => false,
            ViewMode::DetailRaw => true,
            _ => return,
        };
        let lines = match self.selected_record() {
            Some(entry) if raw => content::raw_lines(entry),
            Some(entry) => {
                let spans: &[Span] = if entry.trace_id.is_some()
                    && entry.trace_id == self.spans.last_trace_id
                {
                    &self.spans.spans
                } else {
                    &[]
                };
                content::entry_detail_lines(entry, spans, self.viewport.0)
            }
            None => vec!["No entry selected".to_string()],
        };
        self.detail.scroll = self.detail.scroll.min(lines.len().saturating_sub(1));
        self.detail.lines = lines;
    }

    fn scroll_content(&mut self, delta: isize) {
        match self.views.current() {
            ViewMode::Detail | ViewMode::DetailRaw => {
                let max = self.detail.lines.len().saturating_sub(1);
                self.detail.scroll = self.detail.scroll.saturating_add_signed(delta).min(max);
            }
            ViewMode::Chat => {
                let max = self
                    .chat
                    .messages
                    .iter()
                    .map(|m| m.content.lines().count() + 1)
                    .sum::<usize>();
                self.chat.scroll_back = self.chat.scroll_back.saturating_add_signed(-delta).min(max);
            }
            ViewMode::ErrorModal
            | ViewMode::QueryOverlay
            | ViewMode::Help
            | ViewMode::CollectorConfig(_) => {
                let max = self.modal_lines().len().saturating_sub(1);
                self.modal_scroll = self.modal_scroll.saturating_add_signed(delta).min(max);
            }
            _ => {}
        }
    }

    /// Content of the active text modal.
    pub fn modal_lines(&self) -> Vec<String> {
        match self.views.current() {
            ViewMode::ErrorModal => self
                .error
                .as_deref()
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect(),
            ViewMode::QueryOverlay if self.last_query_repr.is_empty() => {
                vec!["No query has been sent yet.".to_string()]
            }
            ViewMode::QueryOverlay => self.last_query_repr.lines().map(str::to_string).collect(),
            ViewMode::CollectorConfig(signal) => {
                content::collector_snippet(signal, &self.settings.collector_endpoint)
            }
            ViewMode::Help => vec![String::new(); content::help_line_count()],
            _ => Vec::new(),
        }
    }

    // ---- text input ----

    fn submit_input(&mut self) -> Command {
        match self.views.current() {
            ViewMode::SearchInput => {
                let query = self.search_input.take();
                self.views.pop();
                if query == self.filters.query {
                    return Command::None;
                }
                self.filters.query = query;
                self.filters_changed()
            }
            ViewMode::Chat => self.submit_chat(),
            ViewMode::Credentials => {
                let credentials = Credentials {
                    username: self.credentials.username.text().to_string(),
                    secret: self.credentials.secret.take(),
                };
                self.views.pop();
                info!(username = %credentials.username, "credentials updated");
                self.set_status("Credentials updated");
                Command::batch([Command::ApplyCredentials(credentials), self.fetch_primary()])
            }
            _ => Command::None,
        }
    }

    fn submit_chat(&mut self) -> Command {
        let prompt = self.chat.input.take();
        if prompt.trim().is_empty() {
            return Command::None;
        }
        let skip = self.chat.messages.len().saturating_sub(CHAT_HISTORY_LIMIT);
        let history = self.chat.messages[skip..].to_vec();
        self.chat.messages.push(ChatMessage {
            role: ChatRole::User,
            content: prompt.clone(),
        });
        self.chat.scroll_back = 0;
        let request = ChatRequest {
            prompt,
            history,
            context: self.chat_context(),
        };
        self.start_fetch(FetchRequest::Chat(request))
    }

    fn chat_context(&self) -> String {
        let mut context = format!("signal={}  {}", self.signal.label(), self.filters.summary());
        if let Some(entry) = self.entries.selected_item() {
            context.push_str(&format!("\nselected entry: {}", entry.message));
        }
        context
    }

    // ---- outbound ----

    fn copy_selection(&mut self) -> Command {
        let text = match self.views.current() {
            ViewMode::EntryList => self.selected_record().map(|e| e.message.clone()),
            ViewMode::MetricDetail | ViewMode::DetailRaw => {
                self.selected_record().map(LogEntry::to_pretty_json)
            }
            ViewMode::Detail => Some(self.detail.lines.join("\n")),
            ViewMode::TransactionNames => self.transactions.selected_item().map(|t| t.name.clone()),
            ViewMode::MetricsDashboard => self.metrics.selected_item().map(|m| m.name.clone()),
            ViewMode::ErrorModal => self.error.clone(),
            ViewMode::QueryOverlay if !self.last_query_repr.is_empty() => {
                Some(self.last_query_repr.clone())
            }
            mode @ ViewMode::CollectorConfig(_) => Some(self.modal_lines_for(mode).join("\n")),
            _ => None,
        };
        match text {
            Some(text) => {
                self.set_status("Copied to clipboard");
                Command::CopyToClipboard(text)
            }
            None => Command::None,
        }
    }

    fn modal_lines_for(&self, mode: ViewMode) -> Vec<String> {
        match mode {
            ViewMode::CollectorConfig(signal) => {
                content::collector_snippet(signal, &self.settings.collector_endpoint)
            }
            _ => self.modal_lines(),
        }
    }

    fn open_in_browser(&mut self) -> Command {
        let Some(template) = self.settings.web_url.clone() else {
            self.set_status("No web UI URL configured (--web-url)");
            return Command::None;
        };
        let trace_id = self.selected_record().and_then(|e| e.trace_id.clone());
        let url = expand_url_template(
            &template,
            trace_id.as_deref(),
            &self.filters.index,
            &self.filters.query,
        );
        self.set_status("Opening web UI");
        Command::OpenUrl(url)
    }

    // ---- fetching ----

    fn timeout_for(&self, kind: RequestKind) -> Duration {
        match kind {
            RequestKind::AutoDetectRange => self.settings.timeouts.auto_detect,
            RequestKind::Chat => self.settings.timeouts.chat,
            _ => self.settings.timeouts.request,
        }
    }

    fn start_fetch(&mut self, request: FetchRequest) -> Command {
        let kind = request.kind();
        let ticket = self.requests.start(kind, self.timeout_for(kind));
        self.loading.insert(kind, Instant::now());
        Command::Fetch(FetchJob { ticket, request })
    }

    /// Filters changed: resume tail-follow and refetch what is on screen.
    fn filters_changed(&mut self) -> Command {
        self.entries.selection.reset_follow();
        self.metric_docs.selection.reset_follow();
        self.fetch_primary()
    }

    /// Refetch the data behind the current screen.
    pub fn fetch_primary(&mut self) -> Command {
        self.fetch_view(self.views.screen())
    }

    /// Refetch the signal's base list and, when the screen shows a
    /// different domain (a drill-down), that one as well. Chat or an
    /// overlay on top never suppresses the base fetch.
    fn fetch_base_and_screen(&mut self) -> Command {
        let base = self.views.base();
        let screen = self.views.screen();
        let base_fetch = self.fetch_view(base);
        let screen_kind = self.view_domain(screen);
        if screen_kind.is_some() && screen_kind != self.view_domain(base) {
            Command::batch([base_fetch, self.fetch_view(screen)])
        } else {
            base_fetch
        }
    }

    /// Request kind that fills `mode`, if any.
    fn view_domain(&self, mode: ViewMode) -> Option<RequestKind> {
        match mode {
            ViewMode::EntryList => Some(RequestKind::Entries),
            ViewMode::TransactionNames => Some(RequestKind::TransactionNames),
            ViewMode::MetricsDashboard => Some(RequestKind::MetricsAggregate),
            ViewMode::MetricDetail => Some(RequestKind::MetricDocuments),
            ViewMode::Detail | ViewMode::DetailRaw => match self.detail.origin {
                ViewMode::MetricDetail => Some(RequestKind::MetricDocuments),
                _ => Some(RequestKind::Entries),
            },
            _ => None,
        }
    }

    fn fetch_view(&mut self, mode: ViewMode) -> Command {
        match self.view_domain(mode) {
            Some(RequestKind::Entries) => self.fetch_entries(),
            Some(RequestKind::TransactionNames) => self.fetch_transactions(),
            Some(RequestKind::MetricsAggregate) => self.fetch_metrics(),
            Some(RequestKind::MetricDocuments) => self.fetch_metric_docs(),
            _ => Command::None,
        }
    }

    fn fetch_entries(&mut self) -> Command {
        let transaction = match self.signal {
            SignalType::Traces => self.filters.transaction.clone(),
            _ => None,
        };
        let query = EntryQuery {
            scope: self.filters.scope(self.signal),
            sort: self.filters.sort,
            limit: self.settings.page_size,
            transaction,
        };
        self.start_fetch(FetchRequest::Entries(query))
    }

    fn fetch_transactions(&mut self) -> Command {
        let scope = self.filters.scope(self.signal);
        self.start_fetch(FetchRequest::TransactionNames(TransactionQuery { scope }))
    }

    fn fetch_metrics(&mut self) -> Command {
        let query = MetricsQuery {
            scope: self.filters.scope(self.signal),
            buckets: METRIC_BUCKETS,
        };
        self.start_fetch(FetchRequest::MetricsAggregate(query))
    }

    fn fetch_metric_docs(&mut self) -> Command {
        let Some(metric) = self.selected_metric.clone() else {
            return Command::None;
        };
        let query = MetricDocQuery {
            index: self.filters.index.clone(),
            metric,
            lookback: self.filters.lookback,
            limit: METRIC_DOC_LIMIT,
        };
        self.start_fetch(FetchRequest::MetricDocuments(query))
    }

    fn fetch_fields(&mut self) -> Command {
        let query = FieldQuery {
            index: self.filters.index.clone(),
            signal: self.signal,
        };
        self.start_fetch(FetchRequest::FieldMetadata(query))
    }

    fn fetch_perspective(&mut self) -> Command {
        let query = PerspectiveQuery {
            scope: self.filters.scope(self.signal),
            kind: self.perspective.kind,
        };
        self.start_fetch(FetchRequest::PerspectiveRollup(query))
    }

    fn start_auto_detect(&mut self) -> Command {
        let probe = RangeProbe {
            index: self.filters.index.clone(),
            signal: self.signal,
        };
        self.start_fetch(FetchRequest::AutoDetectRange(probe))
    }

    /// Whether spans for `trace_id` still have to be requested.
    pub fn needs_span_fetch(&self, trace_id: &str) -> bool {
        if self.spans.last_trace_id.as_deref() != Some(trace_id) {
            return true;
        }
        !(self.requests.in_flight(RequestKind::Spans) || !self.spans.spans.is_empty())
    }

    fn maybe_fetch_spans(&mut self) -> Command {
        if self.signal != SignalType::Traces {
            return Command::None;
        }
        let Some(trace_id) = self.entries.selected_item().and_then(|e| e.trace_id.clone()) else {
            return Command::None;
        };
        if !self.needs_span_fetch(&trace_id) {
            return Command::None;
        }
        self.spans.last_trace_id = Some(trace_id.clone());
        self.spans.spans.clear();
        let query = SpanQuery {
            index: self.filters.index.clone(),
            trace_id,
        };
        self.start_fetch(FetchRequest::Spans(query))
    }

    fn on_tick(&mut self) -> Command {
        let refresh = if self.auto_refresh
            && self.views.screen() == ViewMode::EntryList
            && !self.requests.in_flight(RequestKind::Entries)
        {
            self.fetch_entries()
        } else {
            Command::None
        };
        Command::batch([refresh, Command::ScheduleTick(self.settings.refresh_interval)])
    }

    // ---- results ----

    fn handle_fetch_result(&mut self, result: FetchResult) -> Command {
        let FetchResult { ticket, outcome } = result;
        let kind = ticket.kind;
        if !self.requests.done(&ticket) {
            debug!(
                kind = kind.label(),
                generation = ticket.generation,
                "discarding superseded result"
            );
            return Command::None;
        }
        self.loading.remove(&kind);

        if kind == RequestKind::AutoDetectRange {
            return self.on_range_detected(outcome);
        }

        match outcome {
            Ok(payload) => {
                if !self.views.contains(ViewMode::ErrorModal) {
                    self.error = None;
                }
                self.apply_payload(payload)
            }
            Err(error) => {
                self.report_error(kind, error);
                Command::None
            }
        }
    }

    fn report_error(&mut self, kind: RequestKind, error: BackendError) {
        if error.is_cancellation() {
            debug!(kind = kind.label(), %error, "request ended without a result");
            return;
        }
        warn!(kind = kind.label(), %error, "request failed");
        self.error = Some(format!("Loading {} failed:\n{error}", kind.label()));
        self.modal_scroll = 0;
        self.open(ViewMode::ErrorModal);
    }

    fn on_range_detected(&mut self, outcome: Result<FetchPayload, BackendError>) -> Command {
        match outcome {
            Ok(FetchPayload::DetectedRange(Some(lookback))) => {
                if lookback != self.filters.lookback {
                    info!(%lookback, "adopting detected lookback");
                    self.filters.lookback = lookback;
                    self.set_status(format!("Lookback: last {lookback}"));
                }
            }
            Ok(_) => debug!("time range detection found no data"),
            Err(error) => debug!(%error, "time range detection failed; keeping lookback"),
        }
        self.fetch_base_and_screen()
    }

    fn apply_payload(&mut self, payload: FetchPayload) -> Command {
        match payload {
            FetchPayload::Entries(page) => {
                self.last_query_repr = page.query_repr;
                self.entries_total = page.total;
                self.entries.replace_following(page.entries, self.filters.sort);
                self.refresh_detail();
                self.maybe_fetch_spans()
            }
            FetchPayload::FieldMetadata(fields) => {
                self.fields.replace(fields);
                Command::None
            }
            FetchPayload::Metrics(overview) => {
                self.last_query_repr = overview.query_repr;
                self.metrics.replace(overview.series);
                Command::None
            }
            FetchPayload::MetricDocuments(page) => {
                self.last_query_repr = page.query_repr;
                self.metric_docs
                    .replace_following(page.entries, SortOrder::NewestFirst);
                self.refresh_detail();
                Command::None
            }
            FetchPayload::TransactionNames(transactions) => {
                self.transactions.replace(transactions);
                Command::None
            }
            FetchPayload::Spans(spans) => {
                self.spans.spans = spans;
                self.refresh_detail();
                Command::None
            }
            FetchPayload::Perspective(items) => {
                self.perspective.items.replace(items);
                Command::None
            }
            FetchPayload::Chat(reply) => {
                self.chat.messages.push(ChatMessage {
                    role: ChatRole::Assistant,
                    content: reply.content,
                });
                self.chat.scroll_back = 0;
                Command::None
            }
            FetchPayload::DetectedRange(_) => Command::None,
        }
    }

    // ---- status ----

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn expire_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|status| now.duration_since(status.shown_at) >= STATUS_MESSAGE_TTL)
        {
            self.status = None;
        }
    }

    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.loading.contains_key(&kind)
    }

    /// "loading entries 3s" for the longest outstanding request.
    pub fn loading_summary(&self, now: Instant) -> Option<String> {
        let (kind, started) = self.loading.iter().min_by_key(|(_, started)| **started)?;
        let elapsed = now.duration_since(*started);
        if elapsed >= LOADING_ELAPSED_THRESHOLD {
            Some(format!("loading {} {}s", kind.label(), elapsed.as_secs()))
        } else {
            Some(format!("loading {}", kind.label()))
        }
    }
}
