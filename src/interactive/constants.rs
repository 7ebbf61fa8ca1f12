//! Constants for the interactive client
//!
//! Timing and layout values shared by the event loop, the state machine
//! and the components.

use std::time::Duration;

// Timing constants
/// How long a transient status message stays in the footer
pub const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(2);

/// Redraw cadence; also expires status messages and loading timers
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

/// Input reader poll timeout
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Loading indicators only show the elapsed time after this long
pub const LOADING_ELAPSED_THRESHOLD: Duration = Duration::from_secs(1);

// Navigation constants
/// Rows moved by PageUp/PageDown
pub const PAGE_SIZE: isize = 10;

/// Rows moved per mouse wheel notch
pub const WHEEL_STEP: isize = 3;

// Query constants
/// Buckets requested for every metric sparkline
pub const METRIC_BUCKETS: usize = 30;

/// Documents shown in the metric detail view
pub const METRIC_DOC_LIMIT: usize = 100;

/// Chat turns sent back to the backend as history
pub const CHAT_HISTORY_LIMIT: usize = 20;

// Layout constants
/// Height of the header (title and filter summary)
pub const HEADER_HEIGHT: u16 = 3;

/// Height of the footer status line
pub const FOOTER_HEIGHT: u16 = 1;

/// Timestamp column width
pub const TIMESTAMP_COLUMN_WIDTH: u16 = 19;

/// Level column width
pub const LEVEL_COLUMN_WIDTH: u16 = 6;

/// Service column width
pub const SERVICE_COLUMN_WIDTH: u16 = 14;

/// Maximum width for modal dialogs
pub const MODAL_MAX_WIDTH: u16 = 90;

/// Minimum margin around modal dialogs
pub const MODAL_MARGIN: u16 = 4;
