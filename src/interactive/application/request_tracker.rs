use crate::backend::RequestContext;
use crate::interactive::domain::models::RequestKind;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle for one started request. The generation is the request's
/// identity: a ticket is current only while the tracker still holds the
/// same generation for its kind.
#[derive(Clone, Debug)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub generation: u64,
    pub ctx: RequestContext,
}

#[derive(Debug)]
struct RequestState {
    generation: u64,
    token: CancellationToken,
}

/// One cancellation handle per [`RequestKind`]. Never blocks; only the
/// handle map is touched.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_generation: u64,
    active: HashMap<RequestKind, RequestState>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is running for `kind` and hand out a fresh context.
    pub fn start(&mut self, kind: RequestKind, timeout: Duration) -> RequestTicket {
        if let Some(previous) = self.active.remove(&kind) {
            debug!(
                kind = kind.label(),
                generation = previous.generation,
                "superseding in-flight request"
            );
            previous.token.cancel();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();
        self.active.insert(
            kind,
            RequestState {
                generation,
                token: token.clone(),
            },
        );
        debug!(kind = kind.label(), generation, ?timeout, "request started");

        RequestTicket {
            kind,
            generation,
            ctx: RequestContext::new(token, timeout),
        }
    }

    /// Release `ticket`. Its entry is removed only if it is still the
    /// current one for its kind; returns whether it was.
    pub fn done(&mut self, ticket: &RequestTicket) -> bool {
        ticket.ctx.cancel();
        if self.is_current(ticket) {
            self.active.remove(&ticket.kind);
            true
        } else {
            debug!(
                kind = ticket.kind.label(),
                generation = ticket.generation,
                "finished request was already superseded"
            );
            false
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.current_generation(ticket.kind) == Some(ticket.generation)
    }

    pub fn current_generation(&self, kind: RequestKind) -> Option<u64> {
        self.active.get(&kind).map(|state| state.generation)
    }

    pub fn in_flight(&self, kind: RequestKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn cancel_all(&mut self) {
        for (_, state) in self.active.drain() {
            state.token.cancel();
        }
    }
}
