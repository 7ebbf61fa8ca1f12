//! In-process backend with scripted behavior for exercising the event loop.

use crate::backend::*;
use crate::interactive::domain::models::RequestKind;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct ScriptedBackend {
    entries: usize,
    latency: Duration,
    failure: Option<BackendError>,
    panics: bool,
    detected: Option<Lookback>,
    calls: Arc<Mutex<Vec<RequestKind>>>,
    credentials: Arc<Mutex<Option<Credentials>>>,
}

impl ScriptedBackend {
    pub fn with_entries(count: usize) -> Self {
        Self {
            entries: count,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_detected_range(mut self, lookback: Lookback) -> Self {
        self.detected = Some(lookback);
        self
    }

    pub fn calls(&self) -> Vec<RequestKind> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.lock().ok().and_then(|c| c.clone())
    }

    async fn respond(&self, kind: RequestKind) -> Result<(), BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(kind);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.panics {
            panic!("scripted backend panic");
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// `count` log records, newest first, one second apart. Each carries a
/// distinct trace id so selection changes are observable.
pub fn sample_entries(count: usize) -> Vec<LogEntry> {
    let newest = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    (0..count)
        .map(|i| {
            let mut entry = LogEntry::new(
                RecordKind::Log,
                newest - ChronoDuration::seconds(i as i64),
                format!("message {i}"),
            );
            entry.level = Some(if i % 5 == 0 { "error" } else { "info" }.to_string());
            entry.service = Some("checkout".to_string());
            entry.trace_id = Some(format!("trace-{i}"));
            entry.span_id = Some(format!("span-{i}"));
            entry
        })
        .collect()
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn indices(&self) -> Vec<String> {
        vec!["scripted-*".to_string(), "archive-*".to_string()]
    }

    fn set_credentials(&self, credentials: Credentials) {
        if let Ok(mut slot) = self.credentials.lock() {
            *slot = Some(credentials);
        }
    }

    async fn search_entries(
        &self,
        _ctx: &RequestContext,
        query: &EntryQuery,
    ) -> Result<EntryPage, BackendError> {
        self.respond(RequestKind::Entries).await?;
        let mut entries = sample_entries(self.entries);
        if query.sort == SortOrder::OldestFirst {
            entries.reverse();
        }
        Ok(EntryPage {
            total: entries.len() as u64,
            entries,
            query_repr: format!("{{\"index\":\"{}\"}}", query.scope.index),
        })
    }

    async fn field_metadata(
        &self,
        _ctx: &RequestContext,
        _query: &FieldQuery,
    ) -> Result<Vec<FieldInfo>, BackendError> {
        self.respond(RequestKind::FieldMetadata).await?;
        Ok(["level", "message", "service"]
            .iter()
            .map(|name| FieldInfo {
                name: name.to_string(),
                field_type: "keyword".to_string(),
                searchable: true,
                aggregatable: true,
            })
            .collect())
    }

    async fn detect_range(
        &self,
        _ctx: &RequestContext,
        _probe: &RangeProbe,
    ) -> Result<Option<Lookback>, BackendError> {
        self.respond(RequestKind::AutoDetectRange).await?;
        Ok(self.detected)
    }

    async fn metrics_aggregate(
        &self,
        _ctx: &RequestContext,
        _query: &MetricsQuery,
    ) -> Result<MetricsOverview, BackendError> {
        self.respond(RequestKind::MetricsAggregate).await?;
        let now = Utc::now();
        Ok(MetricsOverview {
            series: ["cpu.usage", "memory.rss"]
                .iter()
                .map(|name| MetricSeries {
                    name: name.to_string(),
                    unit: None,
                    points: vec![MetricPoint {
                        timestamp: now,
                        value: 1.0,
                    }],
                    latest: 1.0,
                    min: 1.0,
                    max: 1.0,
                    avg: 1.0,
                })
                .collect(),
            query_repr: String::new(),
        })
    }

    async fn metric_documents(
        &self,
        _ctx: &RequestContext,
        _query: &MetricDocQuery,
    ) -> Result<EntryPage, BackendError> {
        self.respond(RequestKind::MetricDocuments).await?;
        let entries = sample_entries(self.entries);
        Ok(EntryPage {
            total: entries.len() as u64,
            entries,
            query_repr: String::new(),
        })
    }

    async fn transaction_names(
        &self,
        _ctx: &RequestContext,
        _query: &TransactionQuery,
    ) -> Result<Vec<TransactionSummary>, BackendError> {
        self.respond(RequestKind::TransactionNames).await?;
        Ok(vec![
            TransactionSummary {
                name: "GET /cart".to_string(),
                service: Some("checkout".to_string()),
                count: 12,
                avg_duration_ms: 40.0,
                p95_duration_ms: 90.0,
                error_rate: 0.0,
            },
            TransactionSummary {
                name: "POST /pay".to_string(),
                service: Some("payments".to_string()),
                count: 4,
                avg_duration_ms: 120.0,
                p95_duration_ms: 300.0,
                error_rate: 0.25,
            },
        ])
    }

    async fn spans(&self, _ctx: &RequestContext, query: &SpanQuery) -> Result<Vec<Span>, BackendError> {
        self.respond(RequestKind::Spans).await?;
        let start = Utc::now();
        Ok(vec![
            Span {
                trace_id: query.trace_id.clone(),
                span_id: "root".to_string(),
                parent_span_id: None,
                name: "GET /cart".to_string(),
                service: Some("checkout".to_string()),
                start,
                duration_ms: 40.0,
                is_error: false,
            },
            Span {
                trace_id: query.trace_id.clone(),
                span_id: "child".to_string(),
                parent_span_id: Some("root".to_string()),
                name: "SELECT cart".to_string(),
                service: Some("db".to_string()),
                start,
                duration_ms: 10.0,
                is_error: false,
            },
        ])
    }

    async fn perspective_rollup(
        &self,
        _ctx: &RequestContext,
        _query: &PerspectiveQuery,
    ) -> Result<Vec<PerspectiveItem>, BackendError> {
        self.respond(RequestKind::PerspectiveRollup).await?;
        Ok(vec![
            PerspectiveItem {
                value: "checkout".to_string(),
                count: 10,
                error_count: 2,
            },
            PerspectiveItem {
                value: "payments".to_string(),
                count: 3,
                error_count: 0,
            },
        ])
    }

    async fn chat(&self, _ctx: &RequestContext, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        self.respond(RequestKind::Chat).await?;
        Ok(ChatReply {
            content: format!("echo: {}", request.prompt),
        })
    }
}
