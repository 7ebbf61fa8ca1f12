use super::aggregate;
use super::model::*;
use super::{Backend, BackendError, RequestContext};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const SERVICES: [&str; 4] = ["gateway", "checkout", "payments", "inventory"];
const RESOURCES: [&str; 5] = [
    "GET /orders",
    "POST /orders",
    "POST /pay",
    "GET /items/{id}",
    "PUT /cart",
];
const MESSAGES: [(&str, &str); 8] = [
    ("info", "request served"),
    ("info", "cache hit"),
    ("debug", "connection pool checkout"),
    ("info", "order accepted"),
    ("warn", "slow upstream response"),
    ("warn", "retrying after transient failure"),
    ("error", "upstream timeout"),
    ("error", "payment declined by processor"),
];
const METRICS: [(&str, &str); 4] = [
    ("cpu.usage", "ratio"),
    ("memory.rss", "MiB"),
    ("http.requests", "req/s"),
    ("http.latency.p95", "ms"),
];

const HISTORY_SECS: i64 = 6 * 60 * 60;
const LOG_EVERY_SECS: i64 = 5;
const TRACE_EVERY_SECS: i64 = 15;
const METRIC_EVERY_SECS: i64 = 30;

pub const DEMO_INDEX: &str = "demo-*";

struct Corpus {
    rng: StdRng,
    records: Vec<LogEntry>,
    generated_until: DateTime<Utc>,
    next_trace: u64,
}

impl Corpus {
    fn new(seed: u64, now: DateTime<Utc>) -> Self {
        let mut corpus = Self {
            rng: StdRng::seed_from_u64(seed),
            records: Vec::new(),
            generated_until: now - ChronoDuration::seconds(HISTORY_SECS),
            next_trace: 1,
        };
        corpus.top_up(now);
        corpus
    }

    /// Append records for the time elapsed since the last call so the
    /// entry list keeps growing like a live stream. Records older than the
    /// widest lookback can never be queried and are dropped.
    fn top_up(&mut self, now: DateTime<Utc>) {
        let from = self.generated_until;
        let mut t = from;
        while t < now {
            t += ChronoDuration::seconds(LOG_EVERY_SECS);
            self.push_log(t);
            let elapsed = (t - from).num_seconds();
            if elapsed % TRACE_EVERY_SECS == 0 {
                self.push_trace(t);
            }
            if elapsed % METRIC_EVERY_SECS == 0 {
                self.push_metrics(t);
            }
        }
        self.generated_until = t;

        let cutoff = Lookback::widest().start(now);
        self.records.retain(|record| record.timestamp >= cutoff);
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.gen_range(0..items.len())]
    }

    fn push_log(&mut self, at: DateTime<Utc>) {
        let (level, message) = MESSAGES[self.rng.gen_range(0..MESSAGES.len())];
        let mut entry = LogEntry::new(RecordKind::Log, at, message);
        entry.level = Some(level.to_string());
        entry.service = Some(self.pick(&SERVICES).to_string());
        entry.resource = Some(self.pick(&RESOURCES).to_string());
        entry
            .extra
            .insert("host".into(), format!("node-{}", self.rng.gen_range(1..=3)).into());
        self.records.push(entry);
    }

    fn push_trace(&mut self, at: DateTime<Utc>) {
        let trace_id = format!("{:032x}", self.next_trace);
        self.next_trace += 1;
        let resource = self.pick(&RESOURCES);
        let service = self.pick(&SERVICES);
        let failed = self.rng.gen_bool(0.08);
        let root_ms = self.rng.gen_range(20.0..400.0);

        let mut root = LogEntry::new(RecordKind::Span, at, resource);
        root.trace_id = Some(trace_id.clone());
        root.span_id = Some(format!("{trace_id}-0"));
        root.name = Some(resource.to_string());
        root.service = Some(service.to_string());
        root.resource = Some(resource.to_string());
        root.duration_ms = Some(root_ms);
        root.status = Some(if failed { "error" } else { "ok" }.to_string());
        self.records.push(root);

        let children = self.rng.gen_range(1..=3);
        let mut offset_ms = 1.0;
        for i in 1..=children {
            let child_ms = self.rng.gen_range(1.0..(root_ms / f64::from(children)).max(2.0));
            let mut child = LogEntry::new(
                RecordKind::Span,
                at + ChronoDuration::microseconds((offset_ms * 1000.0) as i64),
                "",
            );
            let name = ["db.query", "cache.get", "http.client", "queue.publish"]
                [self.rng.gen_range(0..4)];
            child.message = name.to_string();
            child.trace_id = Some(trace_id.clone());
            child.span_id = Some(format!("{trace_id}-{i}"));
            child.parent_span_id = Some(format!("{trace_id}-0"));
            child.name = Some(name.to_string());
            child.service = Some(self.pick(&SERVICES).to_string());
            child.duration_ms = Some(child_ms);
            child.status = Some(if failed && i == children { "error" } else { "ok" }.to_string());
            self.records.push(child);
            offset_ms += child_ms;
        }
    }

    fn push_metrics(&mut self, at: DateTime<Utc>) {
        let minutes = at.timestamp() as f64 / 60.0;
        for (name, unit) in METRICS {
            let wave = (minutes / 15.0).sin();
            let value = match name {
                "cpu.usage" => 0.45 + 0.25 * wave + self.rng.gen_range(-0.05..0.05),
                "memory.rss" => 512.0 + 64.0 * wave + self.rng.gen_range(-8.0..8.0),
                "http.requests" => 120.0 + 40.0 * wave + self.rng.gen_range(-10.0..10.0),
                _ => 180.0 + 60.0 * wave + self.rng.gen_range(-20.0..20.0),
            };
            let mut entry = LogEntry::new(RecordKind::Metric, at, format!("{name}={value:.2}"));
            entry.metric = Some(name.to_string());
            entry.value = Some(value);
            entry.service = Some(self.pick(&SERVICES).to_string());
            entry.extra.insert("unit".into(), unit.into());
            self.records.push(entry);
        }
    }
}

/// Synthetic backend with simulated latency, for trying the client
/// without any data on disk.
///
/// With [`DemoBackend::with_required_login`] every call is rejected as
/// unauthorized until matching credentials are applied.
pub struct DemoBackend {
    corpus: Mutex<Corpus>,
    latency: Duration,
    credentials: Mutex<Option<Credentials>>,
    required_login: Option<Credentials>,
}

impl DemoBackend {
    pub fn new(seed: u64, latency: Duration) -> Self {
        Self {
            corpus: Mutex::new(Corpus::new(seed, Utc::now())),
            latency,
            credentials: Mutex::new(None),
            required_login: None,
        }
    }

    pub fn with_required_login(mut self, login: Credentials) -> Self {
        self.required_login = Some(login);
        self
    }

    fn authorize(&self) -> Result<(), BackendError> {
        let Some(required) = &self.required_login else {
            return Ok(());
        };
        let current = self
            .credentials
            .lock()
            .map_err(|e| BackendError::Other(format!("demo credentials unavailable: {e}")))?;
        match current.as_ref() {
            Some(credentials) if credentials == required => Ok(()),
            Some(credentials) => Err(BackendError::Unauthorized(format!(
                "login for user '{}' was rejected",
                credentials.username
            ))),
            None => Err(BackendError::Unauthorized(
                "this backend requires a login; press K to enter credentials".to_string(),
            )),
        }
    }

    /// Wait out the simulated latency, then evaluate `f` over the current
    /// corpus. Cancellation during the wait returns early.
    async fn query<T>(
        &self,
        ctx: &RequestContext,
        f: impl FnOnce(&[LogEntry], DateTime<Utc>) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let latency = self.latency;
        ctx.run(async move {
            tokio::time::sleep(latency).await;
            Ok(())
        })
        .await?;
        self.authorize()?;

        let now = Utc::now();
        let mut corpus = self
            .corpus
            .lock()
            .map_err(|e| BackendError::Other(format!("demo corpus unavailable: {e}")))?;
        corpus.top_up(now);
        f(&corpus.records, now)
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new(7, Duration::from_millis(250))
    }
}

#[async_trait]
impl Backend for DemoBackend {
    fn name(&self) -> &str {
        "demo"
    }

    fn indices(&self) -> Vec<String> {
        vec![DEMO_INDEX.to_string()]
    }

    fn set_credentials(&self, credentials: Credentials) {
        debug!(username = %credentials.username, "demo backend accepted credentials");
        if let Ok(mut slot) = self.credentials.lock() {
            *slot = Some(credentials);
        }
    }

    async fn search_entries(
        &self,
        ctx: &RequestContext,
        query: &EntryQuery,
    ) -> Result<EntryPage, BackendError> {
        self.query(ctx, |records, now| aggregate::search_entries(records, query, now))
            .await
    }

    async fn field_metadata(
        &self,
        ctx: &RequestContext,
        query: &FieldQuery,
    ) -> Result<Vec<FieldInfo>, BackendError> {
        self.query(ctx, |records, _| Ok(aggregate::field_metadata(records, query)))
            .await
    }

    async fn detect_range(
        &self,
        ctx: &RequestContext,
        probe: &RangeProbe,
    ) -> Result<Option<Lookback>, BackendError> {
        self.query(ctx, |records, now| Ok(aggregate::detect_range(records, probe, now)))
            .await
    }

    async fn metrics_aggregate(
        &self,
        ctx: &RequestContext,
        query: &MetricsQuery,
    ) -> Result<MetricsOverview, BackendError> {
        self.query(ctx, |records, now| aggregate::metrics_aggregate(records, query, now))
            .await
    }

    async fn metric_documents(
        &self,
        ctx: &RequestContext,
        query: &MetricDocQuery,
    ) -> Result<EntryPage, BackendError> {
        self.query(ctx, |records, now| Ok(aggregate::metric_documents(records, query, now)))
            .await
    }

    async fn transaction_names(
        &self,
        ctx: &RequestContext,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionSummary>, BackendError> {
        self.query(ctx, |records, now| aggregate::transaction_names(records, query, now))
            .await
    }

    async fn spans(&self, ctx: &RequestContext, query: &SpanQuery) -> Result<Vec<Span>, BackendError> {
        self.query(ctx, |records, _| Ok(aggregate::spans(records, query)))
            .await
    }

    async fn perspective_rollup(
        &self,
        ctx: &RequestContext,
        query: &PerspectiveQuery,
    ) -> Result<Vec<PerspectiveItem>, BackendError> {
        self.query(ctx, |records, now| aggregate::perspective_rollup(records, query, now))
            .await
    }

    async fn chat(&self, ctx: &RequestContext, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        self.query(ctx, |_, _| {
            let turn = request.history.len() / 2 + 1;
            Ok(ChatReply {
                content: format!(
                    "(demo, turn {turn}) You asked: \"{}\". Looking at: {}",
                    request.prompt.trim(),
                    if request.context.is_empty() { "nothing yet" } else { &request.context }
                ),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn ctx(timeout: Duration) -> RequestContext {
        RequestContext::new(CancellationToken::new(), timeout)
    }

    fn scope(signal: SignalType) -> QueryScope {
        QueryScope {
            index: DEMO_INDEX.into(),
            signal,
            query: String::new(),
            min_level: None,
            filters: vec![],
            lookback: "1h".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_demo_serves_every_signal() {
        let backend = DemoBackend::new(1, Duration::ZERO);
        let ctx = ctx(Duration::from_secs(5));

        let page = backend
            .search_entries(
                &ctx,
                &EntryQuery {
                    scope: scope(SignalType::Logs),
                    sort: SortOrder::NewestFirst,
                    limit: 50,
                    transaction: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 50);
        assert!(page.total > 50);

        let transactions = backend
            .transaction_names(&ctx, &TransactionQuery { scope: scope(SignalType::Traces) })
            .await
            .unwrap();
        assert!(!transactions.is_empty());

        let overview = backend
            .metrics_aggregate(
                &ctx,
                &MetricsQuery {
                    scope: scope(SignalType::Metrics),
                    buckets: 30,
                },
            )
            .await
            .unwrap();
        assert_eq!(overview.series.len(), METRICS.len());
    }

    #[tokio::test]
    async fn test_demo_traces_have_children() {
        let backend = DemoBackend::new(3, Duration::ZERO);
        let ctx = ctx(Duration::from_secs(5));
        let roots = backend
            .search_entries(
                &ctx,
                &EntryQuery {
                    scope: scope(SignalType::Traces),
                    sort: SortOrder::NewestFirst,
                    limit: 1,
                    transaction: None,
                },
            )
            .await
            .unwrap();
        let trace_id = roots.entries[0].trace_id.clone().unwrap();
        let spans = backend
            .spans(
                &ctx,
                &SpanQuery {
                    index: DEMO_INDEX.into(),
                    trace_id,
                },
            )
            .await
            .unwrap();
        assert!(!spans.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_latency_respects_deadline() {
        let backend = DemoBackend::new(1, Duration::from_secs(10));
        let result = backend
            .detect_range(
                &ctx(Duration::from_millis(50)),
                &RangeProbe {
                    index: DEMO_INDEX.into(),
                    signal: SignalType::Logs,
                },
            )
            .await;
        assert_eq!(result, Err(BackendError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_demo_chat_echoes_prompt() {
        let backend = DemoBackend::new(1, Duration::ZERO);
        let reply = backend
            .chat(
                &ctx(Duration::from_secs(5)),
                &ChatRequest {
                    prompt: "why are payments failing?".into(),
                    history: vec![],
                    context: "logs, 15m".into(),
                },
            )
            .await
            .unwrap();
        assert!(reply.content.contains("why are payments failing?"));
        assert!(reply.content.contains("logs, 15m"));
    }

    fn login(username: &str, secret: &str) -> Credentials {
        Credentials {
            username: username.into(),
            secret: secret.into(),
        }
    }

    fn logs_range() -> RangeProbe {
        RangeProbe {
            index: DEMO_INDEX.into(),
            signal: SignalType::Logs,
        }
    }

    #[tokio::test]
    async fn test_required_login_gates_every_call() {
        let backend =
            DemoBackend::new(1, Duration::ZERO).with_required_login(login("ops", "hunter2"));
        let ctx = ctx(Duration::from_secs(5));

        match backend.detect_range(&ctx, &logs_range()).await {
            Err(BackendError::Unauthorized(message)) => assert!(message.contains("requires a login")),
            other => panic!("expected unauthorized, got {other:?}"),
        }

        backend.set_credentials(login("ops", "wrong"));
        match backend.detect_range(&ctx, &logs_range()).await {
            Err(BackendError::Unauthorized(message)) => assert!(message.contains("'ops'")),
            other => panic!("expected unauthorized, got {other:?}"),
        }

        backend.set_credentials(login("ops", "hunter2"));
        assert!(backend.detect_range(&ctx, &logs_range()).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_backend_ignores_credentials() {
        let backend = DemoBackend::new(1, Duration::ZERO);
        backend.set_credentials(login("anyone", "x"));
        assert!(backend.detect_range(&ctx(Duration::from_secs(5)), &logs_range()).await.is_ok());
    }

    #[test]
    fn test_top_up_drops_records_outside_widest_lookback() {
        let now = Utc::now();
        let long_ago = now - ChronoDuration::days(8);
        let mut corpus = Corpus::new(3, long_ago);
        assert!(!corpus.records.is_empty());

        // Skip generating the gap; only the pruning matters here.
        corpus.generated_until = now - ChronoDuration::minutes(1);
        corpus.top_up(now);

        let cutoff = Lookback::widest().start(now);
        assert!(!corpus.records.is_empty());
        assert!(corpus.records.iter().all(|r| r.timestamp >= cutoff));
    }
}
