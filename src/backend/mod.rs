//! The data source behind the terminal client.
//!
//! Every method takes a [`RequestContext`] and must return promptly with
//! [`BackendError::Canceled`] or [`BackendError::DeadlineExceeded`] once the
//! context is no longer live.

pub mod aggregate;
mod context;
pub mod demo;
pub mod discovery;
mod error;
pub mod jsonl;
pub mod model;

pub use context::RequestContext;
pub use demo::DemoBackend;
pub use error::BackendError;
pub use jsonl::JsonlBackend;
pub use model::*;

use async_trait::async_trait;

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate index patterns offered by the index picker.
    fn indices(&self) -> Vec<String>;

    /// Applies to calls started after this returns.
    fn set_credentials(&self, credentials: Credentials);

    async fn search_entries(
        &self,
        ctx: &RequestContext,
        query: &EntryQuery,
    ) -> Result<EntryPage, BackendError>;

    async fn field_metadata(
        &self,
        ctx: &RequestContext,
        query: &FieldQuery,
    ) -> Result<Vec<FieldInfo>, BackendError>;

    /// `None` when the probed signal has no data at all.
    async fn detect_range(
        &self,
        ctx: &RequestContext,
        probe: &RangeProbe,
    ) -> Result<Option<Lookback>, BackendError>;

    async fn metrics_aggregate(
        &self,
        ctx: &RequestContext,
        query: &MetricsQuery,
    ) -> Result<MetricsOverview, BackendError>;

    async fn metric_documents(
        &self,
        ctx: &RequestContext,
        query: &MetricDocQuery,
    ) -> Result<EntryPage, BackendError>;

    async fn transaction_names(
        &self,
        ctx: &RequestContext,
        query: &TransactionQuery,
    ) -> Result<Vec<TransactionSummary>, BackendError>;

    async fn spans(&self, ctx: &RequestContext, query: &SpanQuery) -> Result<Vec<Span>, BackendError>;

    async fn perspective_rollup(
        &self,
        ctx: &RequestContext,
        query: &PerspectiveQuery,
    ) -> Result<Vec<PerspectiveItem>, BackendError>;

    async fn chat(
        &self,
        _ctx: &RequestContext,
        _request: &ChatRequest,
    ) -> Result<ChatReply, BackendError> {
        Err(BackendError::Unsupported("chat"))
    }
}
