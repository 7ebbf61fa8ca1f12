use super::list_viewer::{ListRow, fit, truncate};
use super::view_layout::Styles;
use crate::backend::{LogEntry, MetricSeries, PerspectiveItem, RecordKind, TransactionSummary};
use crate::interactive::constants::{LEVEL_COLUMN_WIDTH, SERVICE_COLUMN_WIDTH, TIMESTAMP_COLUMN_WIDTH};
use crate::query::Searchable;
use ratatui::text::{Line, Span};

const EXTRA_COLUMN_WIDTH: usize = 14;
const NUMBER_COLUMN_WIDTH: usize = 10;

/// One entry plus the extra columns picked in the field picker.
pub struct EntryRow<'a> {
    pub entry: &'a LogEntry,
    pub columns: &'a [String],
}

impl EntryRow<'_> {
    fn summary(&self) -> String {
        match (self.entry.kind, &self.entry.name, self.entry.duration_ms) {
            (RecordKind::Span, Some(name), Some(duration)) => {
                format!("{name} ({duration:.1} ms) {}", self.entry.message)
            }
            (RecordKind::Metric, _, _) => match (&self.entry.metric, self.entry.value) {
                (Some(metric), Some(value)) => format!("{metric} = {value}"),
                _ => self.entry.message.clone(),
            },
            _ => self.entry.message.clone(),
        }
    }
}

impl ListRow for EntryRow<'_> {
    fn row(&self, width: usize) -> Line<'static> {
        let entry = self.entry;
        let mut spans = vec![
            Span::styled(
                format!(
                    "{} ",
                    fit(
                        &entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        TIMESTAMP_COLUMN_WIDTH as usize
                    )
                ),
                Styles::dimmed(),
            ),
            Span::styled(
                format!(
                    "{} ",
                    fit(entry.level.as_deref().unwrap_or("-"), LEVEL_COLUMN_WIDTH as usize)
                ),
                Styles::level(entry.parsed_level()),
            ),
            Span::styled(
                format!(
                    "{} ",
                    fit(entry.service.as_deref().unwrap_or("-"), SERVICE_COLUMN_WIDTH as usize)
                ),
                Styles::accent(),
            ),
        ];
        for column in self.columns {
            let value = entry.field(column).map(|v| v.into_owned()).unwrap_or_default();
            spans.push(Span::styled(
                format!("{} ", fit(&value, EXTRA_COLUMN_WIDTH)),
                Styles::label(),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let summary = truncate(&self.summary(), width.saturating_sub(used));
        let style = if entry.is_error() {
            Styles::error()
        } else {
            Styles::normal()
        };
        spans.push(Span::styled(summary, style));
        Line::from(spans)
    }
}

impl ListRow for TransactionSummary {
    fn row(&self, width: usize) -> Line<'static> {
        let numbers = format!(
            "{:>8} {:>w$.1}ms {:>w$.1}ms ",
            self.count,
            self.avg_duration_ms,
            self.p95_duration_ms,
            w = NUMBER_COLUMN_WIDTH
        );
        let name_width = width.saturating_sub(numbers.chars().count() + 8);
        let error_style = if self.error_rate > 0.0 {
            Styles::error()
        } else {
            Styles::dimmed()
        };
        Line::from(vec![
            Span::styled(format!("{} ", fit(&self.name, name_width)), Styles::normal()),
            Span::styled(numbers, Styles::dimmed()),
            Span::styled(format!("{:>6.1}%", self.error_rate * 100.0), error_style),
        ])
    }
}

impl ListRow for MetricSeries {
    fn row(&self, width: usize) -> Line<'static> {
        let unit = self.unit.as_deref().unwrap_or("");
        let stats = format!(
            "{:>w$.2}{unit}  min {:.2} avg {:.2} max {:.2}",
            self.latest,
            self.min,
            self.avg,
            self.max,
            w = NUMBER_COLUMN_WIDTH
        );
        let name_width = width.saturating_sub(stats.chars().count() + 1);
        Line::from(vec![
            Span::styled(format!("{} ", fit(&self.name, name_width)), Styles::normal()),
            Span::styled(stats, Styles::dimmed()),
        ])
    }
}

impl ListRow for PerspectiveItem {
    fn row(&self, width: usize) -> Line<'static> {
        let counts = format!("{:>8} docs {:>6} errors", self.count, self.error_count);
        let value_width = width.saturating_sub(counts.chars().count() + 1);
        let error_style = if self.error_count > 0 {
            Styles::error()
        } else {
            Styles::dimmed()
        };
        Line::from(vec![
            Span::styled(format!("{} ", fit(&self.value, value_width)), Styles::normal()),
            Span::styled(counts, error_style),
        ])
    }
}

/// A checkable row for the index and field pickers.
pub struct PickerRow {
    pub label: String,
    pub detail: Option<String>,
    pub marked: bool,
}

impl ListRow for PickerRow {
    fn row(&self, width: usize) -> Line<'static> {
        let mark = if self.marked { "[x] " } else { "[ ] " };
        let mut spans = vec![
            Span::styled(mark, Styles::action_key()),
            Span::styled(truncate(&self.label, width.saturating_sub(4)), Styles::normal()),
        ];
        if let Some(detail) = &self.detail {
            spans.push(Span::styled(format!("  {detail}"), Styles::dimmed()));
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn entry() -> LogEntry {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap();
        let mut entry = LogEntry::new(RecordKind::Log, timestamp, "payment declined");
        entry.level = Some("error".into());
        entry.service = Some("checkout".into());
        entry
            .extra
            .insert("region".into(), serde_json::Value::String("eu-west".into()));
        entry
    }

    #[test]
    fn test_entry_row_columns() {
        let entry = entry();
        let columns = vec!["region".to_string()];
        let text = line_text(&EntryRow {
            entry: &entry,
            columns: &columns,
        }
        .row(120));
        assert!(text.starts_with("2024-05-01 12:00:00"));
        assert!(text.contains("error"));
        assert!(text.contains("checkout"));
        assert!(text.contains("eu-west"));
        assert!(text.ends_with("payment declined"));
    }

    #[test]
    fn test_entry_row_never_exceeds_width() {
        let mut entry = entry();
        entry.message = "x".repeat(500);
        let text = line_text(&EntryRow {
            entry: &entry,
            columns: &[],
        }
        .row(80));
        assert_eq!(text.chars().count(), 80);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_span_row_shows_name_and_duration() {
        let mut entry = entry();
        entry.kind = RecordKind::Span;
        entry.name = Some("GET /cart".into());
        entry.duration_ms = Some(12.5);
        let text = line_text(&EntryRow {
            entry: &entry,
            columns: &[],
        }
        .row(120));
        assert!(text.contains("GET /cart (12.5 ms)"));
    }

    #[test]
    fn test_picker_row_mark() {
        let row = PickerRow {
            label: "logs-*".into(),
            detail: None,
            marked: true,
        };
        assert_eq!(line_text(&row.row(40)), "[x] logs-*");
    }
}
