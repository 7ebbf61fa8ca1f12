//! Plain-text content for the scrollable views. The state caches these
//! lines and rebuilds them when the selection, the terminal width or the
//! detail mode changes.

use crate::backend::{LogEntry, SignalType, Span};
use std::collections::HashMap;

const WATERFALL_LABEL_WIDTH: usize = 32;

pub fn entry_detail_lines(entry: &LogEntry, spans: &[Span], width: u16) -> Vec<String> {
    let mut lines = vec![
        format!("Timestamp: {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
        format!("Kind:      {:?}", entry.kind),
    ];
    let optional = [
        ("Level:    ", entry.level.as_deref()),
        ("Service:  ", entry.service.as_deref()),
        ("Resource: ", entry.resource.as_deref()),
        ("Name:     ", entry.name.as_deref()),
        ("Status:   ", entry.status.as_deref()),
        ("Trace:    ", entry.trace_id.as_deref()),
        ("Span:     ", entry.span_id.as_deref()),
        ("Parent:   ", entry.parent_span_id.as_deref()),
        ("Metric:   ", entry.metric.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{label} {value}"));
        }
    }
    if let Some(duration) = entry.duration_ms {
        lines.push(format!("Duration:   {duration:.1} ms"));
    }
    if let Some(value) = entry.value {
        lines.push(format!("Value:      {value}"));
    }

    if !entry.extra.is_empty() {
        lines.push(String::new());
        lines.push("Fields:".to_string());
        let mut fields: Vec<_> = entry.extra.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in fields {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("  {key}: {value}"));
        }
    }

    lines.push(String::new());
    lines.push("Message:".to_string());
    lines.extend(entry.message.lines().map(str::to_string));

    if entry.trace_id.is_some() && !spans.is_empty() {
        lines.push(String::new());
        lines.push(format!("Trace waterfall ({} spans):", spans.len()));
        lines.extend(span_waterfall(spans, width));
    }
    lines
}

pub fn raw_lines(entry: &LogEntry) -> Vec<String> {
    entry.to_pretty_json().lines().map(str::to_string).collect()
}

/// One row per span, indented by depth, with a bar placed on the trace's
/// time axis.
pub fn span_waterfall(spans: &[Span], width: u16) -> Vec<String> {
    let Some(trace_start) = spans.iter().map(|span| span.start).min() else {
        return Vec::new();
    };
    let offset_ms = |span: &Span| (span.start - trace_start).num_microseconds().unwrap_or(0) as f64 / 1000.0;
    let total_ms = spans
        .iter()
        .map(|span| offset_ms(span) + span.duration_ms)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let bar_width = (width as usize)
        .saturating_sub(WATERFALL_LABEL_WIDTH + 14)
        .max(10);

    let depths = span_depths(spans);
    spans
        .iter()
        .map(|span| {
            let depth = depths.get(span.span_id.as_str()).copied().unwrap_or(0);
            let mut label = format!("{}{}", "  ".repeat(depth), span.name);
            if label.chars().count() > WATERFALL_LABEL_WIDTH {
                label = label.chars().take(WATERFALL_LABEL_WIDTH - 1).collect::<String>() + "…";
            }
            let start_col = ((offset_ms(span) / total_ms) * bar_width as f64) as usize;
            let len = (((span.duration_ms / total_ms) * bar_width as f64).ceil() as usize).max(1);
            let start_col = start_col.min(bar_width.saturating_sub(1));
            let len = len.min(bar_width - start_col);
            let fill = if span.is_error { '!' } else { '█' };
            format!(
                "{label:<width$} {}{}{} {:>8.1}ms",
                " ".repeat(start_col),
                fill.to_string().repeat(len),
                " ".repeat(bar_width - start_col - len),
                span.duration_ms,
                width = WATERFALL_LABEL_WIDTH
            )
        })
        .collect()
}

fn span_depths(spans: &[Span]) -> HashMap<&str, usize> {
    let parents: HashMap<&str, Option<&str>> = spans
        .iter()
        .map(|span| (span.span_id.as_str(), span.parent_span_id.as_deref()))
        .collect();
    spans
        .iter()
        .map(|span| {
            let mut depth = 0;
            let mut parent = span.parent_span_id.as_deref();
            // Bounded walk; malformed data may contain cycles.
            while let Some(id) = parent {
                if depth > spans.len() {
                    break;
                }
                depth += 1;
                parent = parents.get(id).copied().flatten();
            }
            (span.span_id.as_str(), depth)
        })
        .collect()
}

/// OpenTelemetry collector pipeline exporting `signal` to `endpoint`.
pub fn collector_snippet(signal: SignalType, endpoint: &str) -> Vec<String> {
    let pipeline = signal.label();
    let processors = match signal {
        SignalType::Logs => "[memory_limiter, batch]",
        SignalType::Traces => "[memory_limiter, tail_sampling, batch]",
        SignalType::Metrics => "[memory_limiter, cumulativetodelta, batch]",
    };
    let mut lines = vec![
        format!("# {pipeline} pipeline"),
        "receivers:".to_string(),
        "  otlp:".to_string(),
        "    protocols:".to_string(),
        "      grpc:".to_string(),
        "      http:".to_string(),
        "processors:".to_string(),
        "  memory_limiter:".to_string(),
        "    check_interval: 1s".to_string(),
        "    limit_percentage: 80".to_string(),
        "  batch:".to_string(),
    ];
    match signal {
        SignalType::Traces => lines.extend([
            "  tail_sampling:".to_string(),
            "    policies:".to_string(),
            "      - name: errors".to_string(),
            "        type: status_code".to_string(),
            "        status_code: {status_codes: [ERROR]}".to_string(),
        ]),
        SignalType::Metrics => lines.push("  cumulativetodelta:".to_string()),
        SignalType::Logs => {}
    }
    lines.extend([
        "exporters:".to_string(),
        "  otlp:".to_string(),
        format!("    endpoint: {endpoint}"),
        "service:".to_string(),
        "  pipelines:".to_string(),
        format!("    {pipeline}:"),
        "      receivers: [otlp]".to_string(),
        format!("      processors: {processors}"),
        "      exporters: [otlp]".to_string(),
    ]);
    lines
}

pub const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k ↑/↓", "Move selection"),
            ("PgUp/PgDn", "Move a page"),
            ("g/G", "First / last"),
            ("Enter", "Open detail / drill down"),
            ("Esc", "Back"),
            ("Tab", "Next signal (logs → traces → metrics)"),
        ],
    ),
    (
        "Filters",
        &[
            ("/", "Search query"),
            ("l", "Cycle level filter"),
            ("t", "Cycle lookback"),
            ("s", "Toggle sort order"),
            ("p", "Perspectives (+ include, - exclude, Tab kind)"),
            ("x", "Clear field filters"),
            ("i", "Select index"),
        ],
    ),
    (
        "Views",
        &[
            ("v", "Raw document (in detail)"),
            ("n/N", "Next / previous entry (in detail)"),
            ("f", "Field picker"),
            ("Q", "Backend query"),
            ("c", "Chat"),
            ("K", "Credentials"),
            ("O", "Collector configuration"),
        ],
    ),
    (
        "Other",
        &[
            ("a", "Toggle auto-refresh"),
            ("r", "Refresh now"),
            ("y", "Copy"),
            ("o", "Open in web UI"),
            ("q", "Quit (asks)"),
            ("Ctrl+C", "Quit immediately"),
        ],
    ),
];

pub fn help_line_count() -> usize {
    HELP_SECTIONS
        .iter()
        .map(|(_, bindings)| bindings.len() + 2)
        .sum()
}
