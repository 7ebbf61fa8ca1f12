use super::aggregate;
use super::discovery::{default_source_pattern, discover_source_files};
use super::model::*;
use super::{Backend, BackendError, RequestContext};
use async_trait::async_trait;
use chrono::Utc;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Reads newline-delimited JSON records from local files.
///
/// The "index" of every query is the glob pattern naming the files, so the
/// index picker switches between record sets.
pub struct JsonlBackend {
    patterns: Vec<String>,
}

impl JsonlBackend {
    pub fn new(patterns: Vec<String>) -> Self {
        let patterns = if patterns.is_empty() {
            vec![default_source_pattern()]
        } else {
            patterns
        };
        Self { patterns }
    }

    /// Parse every record file for `index`, checking for cancellation
    /// between files.
    async fn load(&self, ctx: &RequestContext, index: &str) -> Result<Vec<LogEntry>, BackendError> {
        let pattern = index.to_string();
        let worker_ctx = ctx.clone();
        let handle = tokio::task::spawn_blocking(move || load_records(&worker_ctx, &pattern));

        ctx.run(async move {
            handle
                .await
                .map_err(|e| BackendError::Panicked(e.to_string()))?
        })
        .await
    }
}

fn load_records(ctx: &RequestContext, pattern: &str) -> Result<Vec<LogEntry>, BackendError> {
    let files =
        discover_source_files(pattern).map_err(|e| BackendError::InvalidQuery(e.to_string()))?;
    debug!(pattern, files = files.len(), "loading record files");

    let mut records = Vec::new();
    for path in files {
        ctx.check()?;
        read_file(&path, &mut records)?;
    }
    Ok(records)
}

fn read_file(path: &Path, records: &mut Vec<LogEntry>) -> Result<(), BackendError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEntry>(&line) {
            Ok(mut record) => {
                classify(&mut record);
                records.push(record);
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped undecodable lines");
    }
    Ok(())
}

/// Records written without an explicit `kind` are classified by shape.
fn classify(record: &mut LogEntry) {
    if record.kind != RecordKind::Log {
        return;
    }
    if record.metric.is_some() && record.value.is_some() {
        record.kind = RecordKind::Metric;
    } else if record.span_id.is_some() && record.duration_ms.is_some() {
        record.kind = RecordKind::Span;
    }
}

#[async_trait]
impl Backend for JsonlBackend {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn indices(&self) -> Vec<String> {
        self.patterns.clone()
    }

    fn set_credentials(&self, credentials: Credentials) {
        // Local files need no authentication.
        debug!(username = %credentials.username, "jsonl backend ignores credentials");
    }

    async fn search_entries(
        &self,
        ctx: &RequestContext,
        query: &EntryQuery,
    ) -> Result<EntryPage, BackendError> {
        let records = self.load(ctx, &query.scope.index).await?;
        aggregate::search_entries(&records, query, Utc::now())
    }

    async fn field_metadata(
        &self,
        ctx: &RequestContext,
        query: &FieldQuery,
    ) -> Result<Vec<FieldInfo>, BackendError> {
        let records = self.load(ctx, &query.index).await?;
        Ok(aggregate::field_metadata(&records, query))
    }

    async fn detect_range(
        &self,
        ctx: &RequestContext,
        probe: &RangeProbe,
    ) -> Result<Option<Lookback>, BackendError> {
        let records = self.load(ctx, &probe.index).await?;
        Ok(aggregate::detect_range(&records, probe, Utc::now()))
    }

    async fn metrics_aggregate(
        &self,
        ctx: &RequestContext,
        query: &MetricsQuery,
    ) -> Result<MetricsOverview, BackendError> {
        let records = self.load(ctx, &query.scope.index).await?;
        aggregate::metrics_aggregate(&records, query, Utc::now())
    }

    async fn metric_documents(
        &self,
        ctx: &RequestContext,
        query: &MetricDocQuery,
    ) -> Result<EntryPage, BackendError> {
        let records = self.load(ctx, &query.index).await?;
        Ok(aggregate::metric_documents(&records, query, Utc::now()))
    }

    async fn transaction_names(
        &self,
        ctx: &RequestContext,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionSummary>, BackendError> {
        let records = self.load(ctx, &query.scope.index).await?;
        aggregate::transaction_names(&records, query, Utc::now())
    }

    async fn spans(&self, ctx: &RequestContext, query: &SpanQuery) -> Result<Vec<Span>, BackendError> {
        let records = self.load(ctx, &query.index).await?;
        Ok(aggregate::spans(&records, query))
    }

    async fn perspective_rollup(
        &self,
        ctx: &RequestContext,
        query: &PerspectiveQuery,
    ) -> Result<Vec<PerspectiveItem>, BackendError> {
        let records = self.load(ctx, &query.scope.index).await?;
        aggregate::perspective_rollup(&records, query, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    fn write_records(dir: &Path, name: &str, lines: &[String]) {
        let mut file = File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    fn ts(minutes_ago: i64) -> String {
        (Utc::now() - ChronoDuration::minutes(minutes_ago)).to_rfc3339()
    }

    fn ctx() -> RequestContext {
        RequestContext::new(CancellationToken::new(), Duration::from_secs(10))
    }

    fn scope(index: String, signal: SignalType) -> QueryScope {
        QueryScope {
            index,
            signal,
            query: String::new(),
            min_level: None,
            filters: vec![],
            lookback: "1h".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reads_and_classifies_records() {
        let dir = tempdir().unwrap();
        write_records(
            dir.path(),
            "app.jsonl",
            &[
                format!(r#"{{"timestamp":"{}","level":"info","service":"api","message":"hello"}}"#, ts(1)),
                format!(r#"{{"timestamp":"{}","span_id":"s1","trace_id":"t1","name":"GET /","duration_ms":12.5}}"#, ts(2)),
                format!(r#"{{"timestamp":"{}","metric":"cpu","value":0.25}}"#, ts(3)),
                "not json".to_string(),
                String::new(),
            ],
        );
        let index = format!("{}/*.jsonl", dir.path().display());
        let backend = JsonlBackend::new(vec![index.clone()]);

        let page = backend
            .search_entries(
                &ctx(),
                &EntryQuery {
                    scope: scope(index.clone(), SignalType::Logs),
                    sort: SortOrder::NewestFirst,
                    limit: 100,
                    transaction: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].message, "hello");

        let spans = backend
            .spans(
                &ctx(),
                &SpanQuery {
                    index: index.clone(),
                    trace_id: "t1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].duration_ms, 12.5);

        let range = backend
            .detect_range(
                &ctx(),
                &RangeProbe {
                    index,
                    signal: SignalType::Metrics,
                },
            )
            .await
            .unwrap();
        assert_eq!(range, Some(Lookback::PRESETS[0]));
    }

    #[tokio::test]
    async fn test_canceled_context_returns_canceled() {
        let dir = tempdir().unwrap();
        write_records(dir.path(), "a.jsonl", &[format!(r#"{{"timestamp":"{}"}}"#, ts(1))]);
        let index = format!("{}/*.jsonl", dir.path().display());
        let backend = JsonlBackend::new(vec![index.clone()]);

        let ctx = ctx();
        ctx.cancel();
        let result = backend
            .field_metadata(
                &ctx,
                &FieldQuery {
                    index,
                    signal: SignalType::Logs,
                },
            )
            .await;
        assert_eq!(result, Err(BackendError::Canceled));
    }

    #[tokio::test]
    async fn test_chat_is_unsupported() {
        let backend = JsonlBackend::new(vec![]);
        let result = backend
            .chat(
                &ctx(),
                &ChatRequest {
                    prompt: "hi".into(),
                    history: vec![],
                    context: String::new(),
                },
            )
            .await;
        assert_eq!(result, Err(BackendError::Unsupported("chat")));
        assert_eq!(backend.indices(), vec![default_source_pattern()]);
    }
}
