use crate::backend::Polarity;
use crate::interactive::application::fetch_service::FetchResult;
use crossterm::event::{KeyEvent, MouseEvent};

/// Everything that can wake the event loop.
#[derive(Clone, Debug)]
pub enum Message {
    // Terminal events
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),

    // Timers
    Start,
    Tick,
    Redraw,

    // Async events
    FetchCompleted(FetchResult),

    // Semantic input, after the key map
    Action(Action),
}

/// What a key press means in the active view.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    // Selection
    MoveSelection(isize),
    SelectFirst,
    SelectLast,
    ScrollContent(isize),

    // Navigation
    Back,
    Activate,
    ToggleRaw,
    NextSignal,
    ShowHelp,
    OpenChat,

    // Text input
    OpenSearch,
    EditInput(KeyEvent),
    SubmitInput,
    SwitchCredentialField,

    // Filters
    CycleLevel,
    CycleLookback,
    ToggleSort,
    ClearFieldFilters,
    ApplyPerspective(Polarity),
    TogglePerspectiveKind,

    // Refresh
    ToggleAutoRefresh,
    Refresh,

    // Overlays
    OpenIndexPicker,
    OpenFieldPicker,
    OpenQueryOverlay,
    OpenPerspectives,
    OpenCredentials,
    OpenCollectorConfig,

    // Outbound
    CopySelection,
    OpenInBrowser,

    // Quit
    AskQuit,
    ConfirmQuit,
    Quit,
}
