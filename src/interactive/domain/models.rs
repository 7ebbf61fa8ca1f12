pub use crate::backend::{PerspectiveKind, SignalType, SortOrder};
use crate::backend::Level;

/// The screen or overlay currently receiving input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ViewMode {
    EntryList,
    SearchInput,
    Detail,
    DetailRaw,
    IndexPicker,
    QueryOverlay,
    FieldPicker,
    MetricsDashboard,
    MetricDetail,
    TransactionNames,
    PerspectiveList,
    ErrorModal,
    QuitConfirm,
    Help,
    Chat,
    Credentials,
    CollectorConfig(SignalType),
}

impl ViewMode {
    pub const ALL: [ViewMode; 19] = [
        ViewMode::EntryList,
        ViewMode::SearchInput,
        ViewMode::Detail,
        ViewMode::DetailRaw,
        ViewMode::IndexPicker,
        ViewMode::QueryOverlay,
        ViewMode::FieldPicker,
        ViewMode::MetricsDashboard,
        ViewMode::MetricDetail,
        ViewMode::TransactionNames,
        ViewMode::PerspectiveList,
        ViewMode::ErrorModal,
        ViewMode::QuitConfirm,
        ViewMode::Help,
        ViewMode::Chat,
        ViewMode::Credentials,
        ViewMode::CollectorConfig(SignalType::Logs),
        ViewMode::CollectorConfig(SignalType::Traces),
        ViewMode::CollectorConfig(SignalType::Metrics),
    ];

    /// Views that can sit at the bottom of the view stack. Chat is a full
    /// screen but is pushed over the signal's base view, never a base.
    pub fn is_base(self) -> bool {
        matches!(
            self,
            ViewMode::EntryList | ViewMode::MetricsDashboard | ViewMode::TransactionNames
        )
    }

    /// Overlays draw on top of whatever screen lies beneath them.
    pub fn is_overlay(self) -> bool {
        matches!(
            self,
            ViewMode::SearchInput
                | ViewMode::IndexPicker
                | ViewMode::QueryOverlay
                | ViewMode::FieldPicker
                | ViewMode::PerspectiveList
                | ViewMode::ErrorModal
                | ViewMode::QuitConfirm
                | ViewMode::Help
                | ViewMode::Credentials
                | ViewMode::CollectorConfig(_)
        )
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::EntryList => "Entries",
            ViewMode::SearchInput => "Search",
            ViewMode::Detail => "Detail",
            ViewMode::DetailRaw => "Raw document",
            ViewMode::IndexPicker => "Select index",
            ViewMode::QueryOverlay => "Backend query",
            ViewMode::FieldPicker => "Fields",
            ViewMode::MetricsDashboard => "Metrics",
            ViewMode::MetricDetail => "Metric documents",
            ViewMode::TransactionNames => "Transactions",
            ViewMode::PerspectiveList => "Perspective",
            ViewMode::ErrorModal => "Error",
            ViewMode::QuitConfirm => "Quit",
            ViewMode::Help => "Help",
            ViewMode::Chat => "Chat",
            ViewMode::Credentials => "Credentials",
            ViewMode::CollectorConfig(_) => "Collector configuration",
        }
    }
}

/// Base view shown when `signal` is selected.
pub fn base_view(signal: SignalType) -> ViewMode {
    match signal {
        SignalType::Logs => ViewMode::EntryList,
        SignalType::Traces => ViewMode::TransactionNames,
        SignalType::Metrics => ViewMode::MetricsDashboard,
    }
}

/// Categories of backend work; at most one of each is current.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RequestKind {
    Entries,
    FieldMetadata,
    AutoDetectRange,
    MetricsAggregate,
    MetricDocuments,
    TransactionNames,
    Spans,
    PerspectiveRollup,
    Chat,
}

impl RequestKind {
    pub const ALL: [RequestKind; 9] = [
        RequestKind::Entries,
        RequestKind::FieldMetadata,
        RequestKind::AutoDetectRange,
        RequestKind::MetricsAggregate,
        RequestKind::MetricDocuments,
        RequestKind::TransactionNames,
        RequestKind::Spans,
        RequestKind::PerspectiveRollup,
        RequestKind::Chat,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Entries => "entries",
            RequestKind::FieldMetadata => "field metadata",
            RequestKind::AutoDetectRange => "time range detection",
            RequestKind::MetricsAggregate => "metrics",
            RequestKind::MetricDocuments => "metric documents",
            RequestKind::TransactionNames => "transactions",
            RequestKind::Spans => "spans",
            RequestKind::PerspectiveRollup => "perspective",
            RequestKind::Chat => "chat",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Error,
    Warn,
    Info,
    Debug,
}

impl LevelFilter {
    pub fn next(self) -> Self {
        match self {
            LevelFilter::All => LevelFilter::Error,
            LevelFilter::Error => LevelFilter::Warn,
            LevelFilter::Warn => LevelFilter::Info,
            LevelFilter::Info => LevelFilter::Debug,
            LevelFilter::Debug => LevelFilter::All,
        }
    }

    /// Minimum severity an entry needs to pass, `None` for everything.
    pub fn min_level(self) -> Option<Level> {
        match self {
            LevelFilter::All => None,
            LevelFilter::Error => Some(Level::Error),
            LevelFilter::Warn => Some(Level::Warn),
            LevelFilter::Info => Some(Level::Info),
            LevelFilter::Debug => Some(Level::Debug),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LevelFilter::All => "all",
            LevelFilter::Error => "error+",
            LevelFilter::Warn => "warn+",
            LevelFilter::Info => "info+",
            LevelFilter::Debug => "debug+",
        }
    }
}
