use super::BackendError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus deadline handed to every backend call.
///
/// Cancellation is cooperative: backends either poll [`RequestContext::check`]
/// between units of work or race their I/O against it with
/// [`RequestContext::run`].
#[derive(Clone, Debug)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Why this context is no longer usable, if it isn't.
    pub fn check(&self) -> Result<(), BackendError> {
        if self.token.is_cancelled() {
            Err(BackendError::Canceled)
        } else if Instant::now() >= self.deadline {
            Err(BackendError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Run `fut` until it finishes, the token is canceled or the deadline
    /// passes. A passed deadline also cancels the token so that work the
    /// future spawned observes it.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BackendError::Canceled),
            _ = tokio::time::sleep_until(self.deadline) => {
                self.token.cancel();
                Err(BackendError::DeadlineExceeded)
            }
            result = fut => result,
        }
    }
}
