use super::request_tracker::RequestTicket;
use crate::backend::*;
use crate::interactive::domain::models::RequestKind;
use crate::interactive::ui::events::Message;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// What to ask the backend for; one variant per request kind.
#[derive(Clone, Debug)]
pub enum FetchRequest {
    Entries(EntryQuery),
    FieldMetadata(FieldQuery),
    AutoDetectRange(RangeProbe),
    MetricsAggregate(MetricsQuery),
    MetricDocuments(MetricDocQuery),
    TransactionNames(TransactionQuery),
    Spans(SpanQuery),
    PerspectiveRollup(PerspectiveQuery),
    Chat(ChatRequest),
}

impl FetchRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            FetchRequest::Entries(_) => RequestKind::Entries,
            FetchRequest::FieldMetadata(_) => RequestKind::FieldMetadata,
            FetchRequest::AutoDetectRange(_) => RequestKind::AutoDetectRange,
            FetchRequest::MetricsAggregate(_) => RequestKind::MetricsAggregate,
            FetchRequest::MetricDocuments(_) => RequestKind::MetricDocuments,
            FetchRequest::TransactionNames(_) => RequestKind::TransactionNames,
            FetchRequest::Spans(_) => RequestKind::Spans,
            FetchRequest::PerspectiveRollup(_) => RequestKind::PerspectiveRollup,
            FetchRequest::Chat(_) => RequestKind::Chat,
        }
    }
}

/// A started request waiting to be run.
#[derive(Clone, Debug)]
pub struct FetchJob {
    pub ticket: RequestTicket,
    pub request: FetchRequest,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FetchPayload {
    Entries(EntryPage),
    FieldMetadata(Vec<FieldInfo>),
    DetectedRange(Option<Lookback>),
    Metrics(MetricsOverview),
    MetricDocuments(EntryPage),
    TransactionNames(Vec<TransactionSummary>),
    Spans(Vec<Span>),
    Perspective(Vec<PerspectiveItem>),
    Chat(ChatReply),
}

/// The single event every fetch produces.
#[derive(Clone, Debug)]
pub struct FetchResult {
    pub ticket: RequestTicket,
    pub outcome: Result<FetchPayload, BackendError>,
}

/// Runs fetch jobs against the backend on the tokio runtime.
#[derive(Clone)]
pub struct FetchService {
    backend: Arc<dyn Backend>,
}

impl FetchService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Run `job` concurrently. Its only side effect is one
    /// [`Message::FetchCompleted`] on `tx`.
    pub fn spawn(&self, job: FetchJob, tx: UnboundedSender<Message>) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let result = execute(backend.as_ref(), job).await;
            if tx.send(Message::FetchCompleted(result)).is_err() {
                debug!("event loop gone; dropping fetch result");
            }
        })
    }
}

/// Run `job` to completion. Cancellation, the deadline and panics inside
/// the backend all turn into an `Err` outcome.
pub async fn execute(backend: &dyn Backend, job: FetchJob) -> FetchResult {
    let FetchJob { ticket, request } = job;
    let call = ticket.ctx.run(call_backend(backend, &ticket.ctx, &request));
    let outcome = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(BackendError::Panicked(panic_message(panic.as_ref()))),
    };
    debug!(
        kind = ticket.kind.label(),
        generation = ticket.generation,
        ok = outcome.is_ok(),
        "fetch finished"
    );
    FetchResult { ticket, outcome }
}

async fn call_backend(
    backend: &dyn Backend,
    ctx: &RequestContext,
    request: &FetchRequest,
) -> Result<FetchPayload, BackendError> {
    Ok(match request {
        FetchRequest::Entries(q) => FetchPayload::Entries(backend.search_entries(ctx, q).await?),
        FetchRequest::FieldMetadata(q) => {
            FetchPayload::FieldMetadata(backend.field_metadata(ctx, q).await?)
        }
        FetchRequest::AutoDetectRange(p) => {
            FetchPayload::DetectedRange(backend.detect_range(ctx, p).await?)
        }
        FetchRequest::MetricsAggregate(q) => {
            FetchPayload::Metrics(backend.metrics_aggregate(ctx, q).await?)
        }
        FetchRequest::MetricDocuments(q) => {
            FetchPayload::MetricDocuments(backend.metric_documents(ctx, q).await?)
        }
        FetchRequest::TransactionNames(q) => {
            FetchPayload::TransactionNames(backend.transaction_names(ctx, q).await?)
        }
        FetchRequest::Spans(q) => FetchPayload::Spans(backend.spans(ctx, q).await?),
        FetchRequest::PerspectiveRollup(q) => {
            FetchPayload::Perspective(backend.perspective_rollup(ctx, q).await?)
        }
        FetchRequest::Chat(r) => FetchPayload::Chat(backend.chat(ctx, r).await?),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::application::request_tracker::RequestTracker;
    use crate::interactive::test_support::ScriptedBackend;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn entries_request() -> FetchRequest {
        FetchRequest::Entries(EntryQuery {
            scope: QueryScope {
                index: "test".into(),
                signal: SignalType::Logs,
                query: String::new(),
                min_level: None,
                filters: vec![],
                lookback: Lookback::default(),
            },
            sort: SortOrder::NewestFirst,
            limit: 10,
            transaction: None,
        })
    }

    #[tokio::test]
    async fn test_success_produces_payload() {
        let backend = ScriptedBackend::with_entries(3);
        let mut tracker = RequestTracker::new();
        let ticket = tracker.start(RequestKind::Entries, Duration::from_secs(5));
        let result = execute(&backend, FetchJob { ticket, request: entries_request() }).await;
        match result.outcome {
            Ok(FetchPayload::Entries(page)) => assert_eq!(page.entries.len(), 3),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_reported_not_propagated() {
        let backend = ScriptedBackend::panicking();
        let mut tracker = RequestTracker::new();
        let ticket = tracker.start(RequestKind::Entries, Duration::from_secs(5));
        let result = execute(&backend, FetchJob { ticket, request: entries_request() }).await;
        assert!(matches!(result.outcome, Err(BackendError::Panicked(ref m)) if m.contains("scripted")));
        // The ticket comes back so the loop can release it.
        assert!(tracker.done(&result.ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_request_reports_cancellation() {
        let backend = ScriptedBackend::with_entries(1).with_latency(Duration::from_secs(2));
        let mut tracker = RequestTracker::new();
        let first = tracker.start(RequestKind::Entries, Duration::from_secs(5));
        let pending = tokio::spawn({
            let backend = backend.clone();
            let job = FetchJob { ticket: first, request: entries_request() };
            async move { execute(&backend, job).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _second = tracker.start(RequestKind::Entries, Duration::from_secs(5));

        let result = pending.await.unwrap();
        assert_eq!(result.outcome, Err(BackendError::Canceled));
        assert!(!tracker.done(&result.ticket));
    }

    #[tokio::test]
    async fn test_spawn_sends_exactly_one_message() {
        let backend: Arc<dyn Backend> = Arc::new(ScriptedBackend::failing(BackendError::Io(
            "disk on fire".into(),
        )));
        let service = FetchService::new(backend);
        let mut tracker = RequestTracker::new();
        let ticket = tracker.start(RequestKind::Entries, Duration::from_secs(5));
        let (tx, mut rx) = mpsc::unbounded_channel();

        service
            .spawn(FetchJob { ticket, request: entries_request() }, tx)
            .await
            .unwrap();

        match rx.recv().await {
            Some(Message::FetchCompleted(result)) => {
                assert_eq!(result.outcome, Err(BackendError::Io("disk on fire".into())))
            }
            other => panic!("expected fetch result, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }
}
