use crate::query::Searchable;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    #[default]
    Logs,
    Traces,
    Metrics,
}

impl SignalType {
    pub fn next(self) -> Self {
        match self {
            SignalType::Logs => SignalType::Traces,
            SignalType::Traces => SignalType::Metrics,
            SignalType::Metrics => SignalType::Logs,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalType::Logs => "logs",
            SignalType::Traces => "traces",
            SignalType::Metrics => "metrics",
        }
    }

    pub fn record_kind(self) -> RecordKind {
        match self {
            SignalType::Logs => RecordKind::Log,
            SignalType::Traces => RecordKind::Span,
            SignalType::Metrics => RecordKind::Metric,
        }
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "logs" | "log" => Ok(SignalType::Logs),
            "traces" | "trace" | "spans" => Ok(SignalType::Traces),
            "metrics" | "metric" => Ok(SignalType::Metrics),
            other => Err(format!("unknown signal type '{other}'")),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Lenient parse used for whatever the backend stored in `level`.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" | "dbg" => Some(Level::Debug),
            "info" | "information" | "notice" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "err" => Some(Level::Error),
            "fatal" | "critical" | "crit" | "panic" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::NewestFirst,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest first",
            SortOrder::OldestFirst => "oldest first",
        }
    }
}

/// Relative time window applied to every backend query.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Lookback(Duration);

impl Lookback {
    pub const PRESETS: [Lookback; 6] = [
        Lookback(Duration::from_secs(5 * 60)),
        Lookback(Duration::from_secs(15 * 60)),
        Lookback(Duration::from_secs(60 * 60)),
        Lookback(Duration::from_secs(4 * 60 * 60)),
        Lookback(Duration::from_secs(24 * 60 * 60)),
        Lookback(Duration::from_secs(7 * 24 * 60 * 60)),
    ];

    pub const fn from_duration(duration: Duration) -> Self {
        Lookback(duration)
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    pub fn as_chrono(self) -> ChronoDuration {
        ChronoDuration::from_std(self.0).unwrap_or(ChronoDuration::MAX)
    }

    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.as_chrono())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Next preset strictly larger than this window, wrapping to the smallest.
    pub fn next_preset(self) -> Self {
        Self::PRESETS
            .iter()
            .copied()
            .find(|preset| *preset > self)
            .unwrap_or(Self::PRESETS[0])
    }

    /// Smallest preset that covers `age`, or the largest preset.
    pub fn covering(age: Duration) -> Self {
        Self::PRESETS
            .iter()
            .copied()
            .find(|preset| preset.0 >= age)
            .unwrap_or(Self::widest())
    }

    pub const fn widest() -> Self {
        Self::PRESETS[Self::PRESETS.len() - 1]
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::PRESETS[1]
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs > 0 && secs % 86_400 == 0 {
            write!(f, "{}d", secs / 86_400)
        } else if secs > 0 && secs % 3_600 == 0 {
            write!(f, "{}h", secs / 3_600)
        } else if secs > 0 && secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{secs}s")
        }
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_lookback(s)
    }
}

fn parse_lookback(input: &str) -> Result<Lookback, String> {
    use nom::{
        IResult, Parser,
        character::complete::{digit1, one_of},
        combinator::{all_consuming, map_res},
    };

    fn parts(input: &str) -> IResult<&str, (u64, char)> {
        (map_res(digit1, str::parse::<u64>), one_of("smhdw")).parse(input)
    }

    let (_, (amount, unit)) = all_consuming(parts)
        .parse(input.trim())
        .map_err(|_| format!("invalid lookback '{input}' (expected e.g. 15m, 1h, 7d)"))?;
    if amount == 0 {
        return Err(format!("lookback '{input}' must be positive"));
    }
    let unit_secs = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        _ => 604_800,
    };
    amount
        .checked_mul(unit_secs)
        .map(|secs| Lookback(Duration::from_secs(secs)))
        .ok_or_else(|| format!("lookback '{input}' is too large"))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Include,
    Exclude,
}

/// `service = checkout` (include) or `service != checkout` (exclude).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
    pub polarity: Polarity,
}

impl FieldFilter {
    pub fn include(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            polarity: Polarity::Include,
        }
    }

    pub fn exclude(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            polarity: Polarity::Exclude,
        }
    }

    pub fn matches<R: Searchable + ?Sized>(&self, record: &R) -> bool {
        let equal = record
            .field(&self.field)
            .is_some_and(|v| v.eq_ignore_ascii_case(&self.value));
        match self.polarity {
            Polarity::Include => equal,
            Polarity::Exclude => !equal,
        }
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.polarity {
            Polarity::Include => "=",
            Polarity::Exclude => "!=",
        };
        write!(f, "{}{}{}", self.field, op, self.value)
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Log,
    Span,
    Metric,
}

/// A single document returned by the backend: a log line, a span or a
/// metric sample, plus whatever extra fields it carried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub kind: RecordKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    pub fn new(kind: RecordKind, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            level: None,
            service: None,
            resource: None,
            message: message.into(),
            trace_id: None,
            span_id: None,
            parent_span_id: None,
            name: None,
            duration_ms: None,
            status: None,
            metric: None,
            value: None,
            extra: Map::new(),
        }
    }

    pub fn parsed_level(&self) -> Option<Level> {
        self.level.as_deref().and_then(Level::parse_loose)
    }

    pub fn is_error(&self) -> bool {
        self.parsed_level().is_some_and(|level| level >= Level::Error)
            || self
                .status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case("error"))
    }

    /// Root spans start a trace; they name the transaction.
    pub fn is_root_span(&self) -> bool {
        self.kind == RecordKind::Span && self.parent_span_id.is_none()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

impl Searchable for LogEntry {
    fn text(&self) -> &str {
        &self.message
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let known = match name {
            "message" | "msg" => Some(self.message.as_str()),
            "level" => self.level.as_deref(),
            "service" => self.service.as_deref(),
            "resource" => self.resource.as_deref(),
            "trace_id" => self.trace_id.as_deref(),
            "span_id" => self.span_id.as_deref(),
            "parent_span_id" => self.parent_span_id.as_deref(),
            "name" => self.name.as_deref(),
            "status" => self.status.as_deref(),
            "metric" => self.metric.as_deref(),
            _ => None,
        };
        if let Some(value) = known {
            return Some(Cow::Borrowed(value));
        }
        match name {
            "duration_ms" => return self.duration_ms.map(|d| Cow::Owned(d.to_string())),
            "value" => return self.value.map(|v| Cow::Owned(v.to_string())),
            _ => {}
        }
        match self.extra.get(name)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Null => None,
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryPage {
    pub entries: Vec<LogEntry>,
    pub total: u64,
    pub query_repr: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: String,
    pub searchable: bool,
    pub aggregatable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    pub unit: Option<String>,
    pub points: Vec<MetricPoint>,
    pub latest: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsOverview {
    pub series: Vec<MetricSeries>,
    pub query_repr: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionSummary {
    pub name: String,
    pub service: Option<String>,
    pub count: u64,
    pub avg_duration_ms: f64,
    pub p95_duration_ms: f64,
    pub error_rate: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub service: Option<String>,
    pub start: DateTime<Utc>,
    pub duration_ms: f64,
    pub is_error: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PerspectiveKind {
    #[default]
    Services,
    Resources,
}

impl PerspectiveKind {
    pub fn next(self) -> Self {
        match self {
            PerspectiveKind::Services => PerspectiveKind::Resources,
            PerspectiveKind::Resources => PerspectiveKind::Services,
        }
    }

    /// Record field the perspective groups by.
    pub fn field(self) -> &'static str {
        match self {
            PerspectiveKind::Services => "service",
            PerspectiveKind::Resources => "resource",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerspectiveKind::Services => "Services",
            PerspectiveKind::Resources => "Resources",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveItem {
    pub value: String,
    pub count: u64,
    pub error_count: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub prompt: String,
    pub history: Vec<ChatMessage>,
    /// Short textual summary of what the operator is looking at.
    pub context: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub content: String,
}

/// Filters shared by every domain query.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryScope {
    pub index: String,
    pub signal: SignalType,
    pub query: String,
    pub min_level: Option<Level>,
    pub filters: Vec<FieldFilter>,
    pub lookback: Lookback,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntryQuery {
    pub scope: QueryScope,
    pub sort: SortOrder,
    pub limit: usize,
    /// Traces drill-down: only root spans of this transaction.
    pub transaction: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldQuery {
    pub index: String,
    pub signal: SignalType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeProbe {
    pub index: String,
    pub signal: SignalType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricsQuery {
    pub scope: QueryScope,
    pub buckets: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricDocQuery {
    pub index: String,
    pub metric: String,
    pub lookback: Lookback,
    pub limit: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionQuery {
    pub scope: QueryScope,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpanQuery {
    pub index: String,
    pub trace_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveQuery {
    pub scope: QueryScope,
    pub kind: PerspectiveKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_parse_and_display() {
        let lookback: Lookback = "15m".parse().unwrap();
        assert_eq!(lookback.duration(), Duration::from_secs(900));
        assert_eq!(lookback.to_string(), "15m");
        assert_eq!("2h".parse::<Lookback>().unwrap().to_string(), "2h");
        assert_eq!("7d".parse::<Lookback>().unwrap().to_string(), "7d");
        assert_eq!("90s".parse::<Lookback>().unwrap().to_string(), "90s");
    }

    #[test]
    fn test_lookback_rejects_garbage() {
        assert!("".parse::<Lookback>().is_err());
        assert!("15".parse::<Lookback>().is_err());
        assert!("0m".parse::<Lookback>().is_err());
        assert!("1h30m".parse::<Lookback>().is_err());
    }

    #[test]
    fn test_lookback_preset_cycle_wraps() {
        let mut lookback = Lookback::PRESETS[0];
        for expected in Lookback::PRESETS.iter().skip(1) {
            lookback = lookback.next_preset();
            assert_eq!(lookback, *expected);
        }
        assert_eq!(lookback.next_preset(), Lookback::PRESETS[0]);
    }

    #[test]
    fn test_lookback_covering() {
        assert_eq!(Lookback::covering(Duration::from_secs(10)), Lookback::PRESETS[0]);
        assert_eq!(Lookback::covering(Duration::from_secs(20 * 60)), Lookback::PRESETS[2]);
        assert_eq!(
            Lookback::covering(Duration::from_secs(30 * 24 * 3600)),
            Lookback::PRESETS[5]
        );
    }

    #[test]
    fn test_level_parse_loose() {
        assert_eq!(Level::parse_loose("WARNING"), Some(Level::Warn));
        assert_eq!(Level::parse_loose("err"), Some(Level::Error));
        assert_eq!(Level::parse_loose("critical"), Some(Level::Fatal));
        assert_eq!(Level::parse_loose("verbose"), None);
    }

    #[test]
    fn test_entry_deserializes_extra_fields() {
        let json = r#"{"timestamp":"2024-05-01T10:00:00Z","level":"error","service":"api","message":"boom","http.status":503,"region":"eu"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, RecordKind::Log);
        assert!(entry.is_error());
        assert_eq!(entry.field("region").as_deref(), Some("eu"));
        assert_eq!(entry.field("http.status").as_deref(), Some("503"));
        assert_eq!(entry.field("service").as_deref(), Some("api"));
        assert_eq!(entry.field("missing"), None);
    }

    #[test]
    fn test_field_filter_polarity() {
        let mut entry = LogEntry::new(RecordKind::Log, Utc::now(), "hello");
        entry.service = Some("Checkout".to_string());

        assert!(FieldFilter::include("service", "checkout").matches(&entry));
        assert!(!FieldFilter::exclude("service", "checkout").matches(&entry));
        assert!(FieldFilter::exclude("service", "billing").matches(&entry));
        assert!(!FieldFilter::include("resource", "x").matches(&entry));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials {
            username: "ops".to_string(),
            secret: "hunter2".to_string(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("ops"));
        assert!(!debug.contains("hunter2"));
    }
}
