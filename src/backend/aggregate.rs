//! Query evaluation over an in-memory record set.
//!
//! Both bundled backends hold plain [`LogEntry`] records and answer every
//! domain query with the functions below.

use super::BackendError;
use super::model::*;
use crate::query::{QueryCondition, Searchable, parse_filter};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

/// A [`QueryScope`] with its query string parsed once.
pub struct CompiledScope<'a> {
    scope: &'a QueryScope,
    condition: QueryCondition,
    start: DateTime<Utc>,
}

impl<'a> CompiledScope<'a> {
    pub fn new(scope: &'a QueryScope, now: DateTime<Utc>) -> Result<Self, BackendError> {
        let condition =
            parse_filter(&scope.query).map_err(|e| BackendError::InvalidQuery(e.to_string()))?;
        Ok(Self {
            scope,
            condition,
            start: scope.lookback.start(now),
        })
    }

    pub fn matches(&self, record: &LogEntry) -> Result<bool, BackendError> {
        if record.kind != self.scope.signal.record_kind() || record.timestamp < self.start {
            return Ok(false);
        }
        if let Some(min_level) = self.scope.min_level
            && !record.parsed_level().is_some_and(|level| level >= min_level)
        {
            return Ok(false);
        }
        if !self.scope.filters.iter().all(|f| f.matches(record)) {
            return Ok(false);
        }
        Ok(self.condition.is_match_all() || self.condition.evaluate(record)?)
    }

    fn select<'r>(&self, records: &'r [LogEntry]) -> Result<Vec<&'r LogEntry>, BackendError> {
        let mut selected = Vec::new();
        for record in records {
            if self.matches(record)? {
                selected.push(record);
            }
        }
        Ok(selected)
    }
}

/// Human-readable rendering of what was asked, shown in the query overlay.
pub fn query_repr(scope: &QueryScope, extra: Value) -> String {
    let filters: Vec<String> = scope.filters.iter().map(ToString::to_string).collect();
    let repr = json!({
        "index": scope.index,
        "signal": scope.signal.label(),
        "range": { "gte": format!("now-{}", scope.lookback), "lte": "now" },
        "query": if scope.query.trim().is_empty() { "*" } else { scope.query.as_str() },
        "min_level": scope.min_level.map(Level::label),
        "filters": filters,
        "request": extra,
    });
    serde_json::to_string_pretty(&repr).unwrap_or_default()
}

pub fn search_entries(
    records: &[LogEntry],
    query: &EntryQuery,
    now: DateTime<Utc>,
) -> Result<EntryPage, BackendError> {
    let scope = CompiledScope::new(&query.scope, now)?;
    let mut selected = scope.select(records)?;
    if let Some(transaction) = &query.transaction {
        selected.retain(|r| r.is_root_span() && r.name.as_deref() == Some(transaction.as_str()));
    }

    match query.sort {
        SortOrder::NewestFirst => selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortOrder::OldestFirst => selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
    }

    let total = selected.len() as u64;
    // Keep the newest `limit` records regardless of display order.
    let entries: Vec<LogEntry> = match query.sort {
        SortOrder::NewestFirst => selected.into_iter().take(query.limit).cloned().collect(),
        SortOrder::OldestFirst => {
            let skip = selected.len().saturating_sub(query.limit);
            selected.into_iter().skip(skip).cloned().collect()
        }
    };

    Ok(EntryPage {
        entries,
        total,
        query_repr: query_repr(
            &query.scope,
            json!({
                "size": query.limit,
                "sort": query.sort.label(),
                "transaction": query.transaction,
            }),
        ),
    })
}

pub fn field_metadata(records: &[LogEntry], query: &FieldQuery) -> Vec<FieldInfo> {
    let kind = query.signal.record_kind();
    let mut fields: BTreeMap<String, &'static str> = BTreeMap::new();

    for record in records.iter().filter(|r| r.kind == kind) {
        let Ok(Value::Object(map)) = serde_json::to_value(record) else {
            continue;
        };
        for (name, value) in map {
            let field_type = match value {
                Value::String(_) => "keyword",
                Value::Number(_) => "number",
                Value::Bool(_) => "boolean",
                Value::Object(_) => "object",
                Value::Array(_) => "array",
                Value::Null => continue,
            };
            fields.entry(name).or_insert(field_type);
        }
    }

    fields
        .into_iter()
        .map(|(name, field_type)| FieldInfo {
            searchable: field_type == "keyword",
            aggregatable: matches!(field_type, "keyword" | "number" | "boolean"),
            field_type: field_type.to_string(),
            name,
        })
        .collect()
}

/// Smallest standard lookback that still contains the newest record of the
/// probed signal; `None` when there are no such records.
pub fn detect_range(records: &[LogEntry], probe: &RangeProbe, now: DateTime<Utc>) -> Option<Lookback> {
    let kind = probe.signal.record_kind();
    let newest = records
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.timestamp)
        .max()?;
    let age = (now - newest).to_std().unwrap_or_default();
    Some(Lookback::covering(age))
}

pub fn metrics_aggregate(
    records: &[LogEntry],
    query: &MetricsQuery,
    now: DateTime<Utc>,
) -> Result<MetricsOverview, BackendError> {
    let scope = CompiledScope::new(&query.scope, now)?;
    let buckets = query.buckets.max(1);
    let start = query.scope.lookback.start(now);
    let width_ms = (query.scope.lookback.as_chrono().num_milliseconds() / buckets as i64).max(1);

    let mut grouped: BTreeMap<String, (Option<String>, Vec<(DateTime<Utc>, f64)>)> =
        BTreeMap::new();
    for record in scope.select(records)? {
        let (Some(name), Some(value)) = (&record.metric, record.value) else {
            continue;
        };
        let entry = grouped.entry(name.clone()).or_default();
        if entry.0.is_none() {
            entry.0 = record.field("unit").map(|u| u.into_owned());
        }
        entry.1.push((record.timestamp, value));
    }

    let series = grouped
        .into_iter()
        .map(|(name, (unit, mut samples))| {
            samples.sort_by_key(|(ts, _)| *ts);
            let mut sums = vec![(0.0_f64, 0_u32); buckets];
            for (ts, value) in &samples {
                let offset = (*ts - start).num_milliseconds().max(0) / width_ms;
                let slot = (offset as usize).min(buckets - 1);
                sums[slot].0 += value;
                sums[slot].1 += 1;
            }
            let points = sums
                .iter()
                .enumerate()
                .filter(|(_, (_, n))| *n > 0)
                .map(|(i, (sum, n))| MetricPoint {
                    timestamp: start + chrono::Duration::milliseconds(width_ms * i as i64),
                    value: sum / f64::from(*n),
                })
                .collect();
            let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
            MetricSeries {
                name,
                unit,
                points,
                latest: values.last().copied().unwrap_or_default(),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                avg: values.iter().sum::<f64>() / values.len().max(1) as f64,
            }
        })
        .collect();

    Ok(MetricsOverview {
        series,
        query_repr: query_repr(&query.scope, json!({ "buckets": buckets })),
    })
}

pub fn metric_documents(
    records: &[LogEntry],
    query: &MetricDocQuery,
    now: DateTime<Utc>,
) -> EntryPage {
    let start = query.lookback.start(now);
    let mut selected: Vec<&LogEntry> = records
        .iter()
        .filter(|r| {
            r.kind == RecordKind::Metric
                && r.timestamp >= start
                && r.metric.as_deref() == Some(query.metric.as_str())
        })
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let repr = json!({
        "index": query.index,
        "range": { "gte": format!("now-{}", query.lookback), "lte": "now" },
        "term": { "metric": query.metric },
        "size": query.limit,
    });
    EntryPage {
        total: selected.len() as u64,
        entries: selected.into_iter().take(query.limit).cloned().collect(),
        query_repr: serde_json::to_string_pretty(&repr).unwrap_or_default(),
    }
}

pub fn transaction_names(
    records: &[LogEntry],
    query: &TransactionQuery,
    now: DateTime<Utc>,
) -> Result<Vec<TransactionSummary>, BackendError> {
    let scope = CompiledScope::new(&query.scope, now)?;
    let mut grouped: HashMap<&str, Vec<&LogEntry>> = HashMap::new();
    for record in scope.select(records)? {
        if !record.is_root_span() {
            continue;
        }
        if let Some(name) = record.name.as_deref() {
            grouped.entry(name).or_default().push(record);
        }
    }

    let mut summaries: Vec<TransactionSummary> = grouped
        .into_iter()
        .map(|(name, spans)| {
            let mut durations: Vec<f64> = spans.iter().filter_map(|s| s.duration_ms).collect();
            durations.sort_by(f64::total_cmp);
            let count = spans.len() as u64;
            let errors = spans.iter().filter(|s| s.is_error()).count() as f64;
            TransactionSummary {
                name: name.to_string(),
                service: spans.iter().find_map(|s| s.service.clone()),
                count,
                avg_duration_ms: durations.iter().sum::<f64>() / durations.len().max(1) as f64,
                p95_duration_ms: percentile(&durations, 0.95),
                error_rate: errors / count.max(1) as f64,
            }
        })
        .collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    Ok(summaries)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

pub fn spans(records: &[LogEntry], query: &SpanQuery) -> Vec<Span> {
    let mut spans: Vec<Span> = records
        .iter()
        .filter(|r| r.kind == RecordKind::Span && r.trace_id.as_deref() == Some(&query.trace_id))
        .map(|r| Span {
            trace_id: query.trace_id.clone(),
            span_id: r.span_id.clone().unwrap_or_default(),
            parent_span_id: r.parent_span_id.clone(),
            name: r.name.clone().unwrap_or_else(|| r.message.clone()),
            service: r.service.clone(),
            start: r.timestamp,
            duration_ms: r.duration_ms.unwrap_or_default(),
            is_error: r.is_error(),
        })
        .collect();
    spans.sort_by_key(|s| s.start);
    spans
}

pub fn perspective_rollup(
    records: &[LogEntry],
    query: &PerspectiveQuery,
    now: DateTime<Utc>,
) -> Result<Vec<PerspectiveItem>, BackendError> {
    let scope = CompiledScope::new(&query.scope, now)?;
    let field = query.kind.field();
    let mut grouped: HashMap<String, (u64, u64)> = HashMap::new();
    for record in scope.select(records)? {
        let Some(value) = record.field(field) else {
            continue;
        };
        let slot = grouped.entry(value.into_owned()).or_default();
        slot.0 += 1;
        if record.is_error() {
            slot.1 += 1;
        }
    }

    let mut items: Vec<PerspectiveItem> = grouped
        .into_iter()
        .map(|(value, (count, error_count))| PerspectiveItem {
            value,
            count,
            error_count,
        })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn log(minutes_ago: i64, level: &str, service: &str, message: &str) -> LogEntry {
        let mut entry = LogEntry::new(
            RecordKind::Log,
            now() - ChronoDuration::minutes(minutes_ago),
            message,
        );
        entry.level = Some(level.to_string());
        entry.service = Some(service.to_string());
        entry
    }

    fn span(minutes_ago: i64, trace: &str, id: &str, parent: Option<&str>, name: &str, ms: f64) -> LogEntry {
        let mut entry = LogEntry::new(
            RecordKind::Span,
            now() - ChronoDuration::minutes(minutes_ago),
            name,
        );
        entry.trace_id = Some(trace.to_string());
        entry.span_id = Some(id.to_string());
        entry.parent_span_id = parent.map(str::to_string);
        entry.name = Some(name.to_string());
        entry.duration_ms = Some(ms);
        entry.service = Some("api".to_string());
        entry
    }

    fn metric(minutes_ago: i64, name: &str, value: f64) -> LogEntry {
        let mut entry = LogEntry::new(
            RecordKind::Metric,
            now() - ChronoDuration::minutes(minutes_ago),
            "",
        );
        entry.metric = Some(name.to_string());
        entry.value = Some(value);
        entry
    }

    fn scope(signal: SignalType, query: &str) -> QueryScope {
        QueryScope {
            index: "test".to_string(),
            signal,
            query: query.to_string(),
            min_level: None,
            filters: vec![],
            lookback: "1h".parse().unwrap(),
        }
    }

    fn records() -> Vec<LogEntry> {
        vec![
            log(1, "info", "api", "request served"),
            log(2, "error", "api", "upstream timeout"),
            log(3, "warn", "worker", "queue is slow"),
            log(90, "error", "api", "too old to matter"),
            span(5, "t1", "s1", None, "GET /orders", 120.0),
            span(5, "t1", "s2", Some("s1"), "db.query", 80.0),
            span(6, "t2", "s3", None, "GET /orders", 200.0),
            span(7, "t3", "s4", None, "POST /pay", 50.0),
            metric(10, "cpu", 0.5),
            metric(5, "cpu", 0.7),
            metric(4, "mem", 100.0),
        ]
    }

    #[test]
    fn test_search_entries_sorts_and_limits() {
        let query = EntryQuery {
            scope: scope(SignalType::Logs, ""),
            sort: SortOrder::NewestFirst,
            limit: 2,
            transaction: None,
        };
        let page = search_entries(&records(), &query, now()).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].message, "request served");
        assert!(page.query_repr.contains("now-1h"));
    }

    #[test]
    fn test_oldest_first_keeps_newest_window() {
        let query = EntryQuery {
            scope: scope(SignalType::Logs, ""),
            sort: SortOrder::OldestFirst,
            limit: 2,
            transaction: None,
        };
        let page = search_entries(&records(), &query, now()).unwrap();
        let messages: Vec<_> = page.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["upstream timeout", "request served"]);
    }

    #[test]
    fn test_scope_filters() {
        let mut s = scope(SignalType::Logs, "NOT timeout");
        s.min_level = Some(Level::Warn);
        let query = EntryQuery {
            scope: s,
            sort: SortOrder::NewestFirst,
            limit: 10,
            transaction: None,
        };
        let page = search_entries(&records(), &query, now()).unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].message, "queue is slow");

        let mut s = scope(SignalType::Logs, "");
        s.filters = vec![FieldFilter::exclude("service", "api")];
        let query = EntryQuery {
            scope: s,
            sort: SortOrder::NewestFirst,
            limit: 10,
            transaction: None,
        };
        assert_eq!(search_entries(&records(), &query, now()).unwrap().total, 1);
    }

    #[test]
    fn test_invalid_query_is_typed_error() {
        let query = EntryQuery {
            scope: scope(SignalType::Logs, "(unclosed"),
            sort: SortOrder::NewestFirst,
            limit: 10,
            transaction: None,
        };
        assert!(matches!(
            search_entries(&records(), &query, now()),
            Err(BackendError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_transaction_drilldown_returns_root_spans() {
        let query = EntryQuery {
            scope: scope(SignalType::Traces, ""),
            sort: SortOrder::NewestFirst,
            limit: 10,
            transaction: Some("GET /orders".to_string()),
        };
        let page = search_entries(&records(), &query, now()).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert!(page.entries.iter().all(LogEntry::is_root_span));
    }

    #[test]
    fn test_transaction_summaries() {
        let query = TransactionQuery {
            scope: scope(SignalType::Traces, ""),
        };
        let summaries = transaction_names(&records(), &query, now()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "GET /orders");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].avg_duration_ms, 160.0);
        assert_eq!(summaries[0].p95_duration_ms, 200.0);
    }

    #[test]
    fn test_spans_for_trace_ordered_by_start() {
        let spans = spans(
            &records(),
            &SpanQuery {
                index: "test".into(),
                trace_id: "t1".into(),
            },
        );
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].parent_span_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_metrics_overview() {
        let query = MetricsQuery {
            scope: scope(SignalType::Metrics, ""),
            buckets: 12,
        };
        let overview = metrics_aggregate(&records(), &query, now()).unwrap();
        assert_eq!(overview.series.len(), 2);
        let cpu = &overview.series[0];
        assert_eq!(cpu.name, "cpu");
        assert_eq!(cpu.latest, 0.7);
        assert_eq!(cpu.min, 0.5);
        assert_eq!(cpu.max, 0.7);
        assert_eq!(cpu.points.len(), 2);
    }

    #[test]
    fn test_metric_documents_newest_first() {
        let page = metric_documents(
            &records(),
            &MetricDocQuery {
                index: "test".into(),
                metric: "cpu".into(),
                lookback: "1h".parse().unwrap(),
                limit: 10,
            },
            now(),
        );
        assert_eq!(page.total, 2);
        assert_eq!(page.entries[0].value, Some(0.7));
    }

    #[test]
    fn test_perspective_rollup_counts_errors() {
        let query = PerspectiveQuery {
            scope: scope(SignalType::Logs, ""),
            kind: PerspectiveKind::Services,
        };
        let items = perspective_rollup(&records(), &query, now()).unwrap();
        assert_eq!(items[0].value, "api");
        assert_eq!(items[0].count, 2);
        assert_eq!(items[0].error_count, 1);
        assert_eq!(items[1].value, "worker");
    }

    #[test]
    fn test_detect_range() {
        let probe = RangeProbe {
            index: "test".into(),
            signal: SignalType::Metrics,
        };
        assert_eq!(
            detect_range(&records(), &probe, now()),
            Some(Lookback::PRESETS[0])
        );
        assert_eq!(detect_range(&[], &probe, now()), None);
    }

    #[test]
    fn test_field_metadata_types() {
        let mut entry = log(1, "info", "api", "hi");
        entry.extra.insert("http.status".into(), json!(200));
        let fields = field_metadata(
            &[entry],
            &FieldQuery {
                index: "test".into(),
                signal: SignalType::Logs,
            },
        );
        let status = fields.iter().find(|f| f.name == "http.status").unwrap();
        assert_eq!(status.field_type, "number");
        assert!(status.aggregatable);
        assert!(fields.iter().any(|f| f.name == "service" && f.searchable));
    }
}
