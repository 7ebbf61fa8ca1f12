use thiserror::Error;

/// Failure of a single backend call.
///
/// Only [`BackendError::Canceled`] and [`BackendError::DeadlineExceeded`] are
/// expected outcomes of normal operation: a newer request of the same kind
/// superseded this one, or it ran out of time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("request canceled")]
    Canceled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("backend call panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Cancellation and timeouts are swallowed silently by the client.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BackendError::Canceled | BackendError::DeadlineExceeded)
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

impl From<regex::Error> for BackendError {
    fn from(err: regex::Error) -> Self {
        BackendError::InvalidQuery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancel_and_timeout_are_cancellation() {
        assert!(BackendError::Canceled.is_cancellation());
        assert!(BackendError::DeadlineExceeded.is_cancellation());

        for err in [
            BackendError::Unsupported("chat"),
            BackendError::InvalidQuery("x".into()),
            BackendError::Io("x".into()),
            BackendError::Decode("x".into()),
            BackendError::Unauthorized("x".into()),
            BackendError::Panicked("x".into()),
            BackendError::Other("x".into()),
        ] {
            assert!(!err.is_cancellation(), "{err} should be surfaced");
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            BackendError::Unsupported("chat").to_string(),
            "chat is not supported by this backend"
        );
        assert_eq!(
            BackendError::InvalidQuery("unexpected ')'".into()).to_string(),
            "invalid query: unexpected ')'"
        );
    }
}
