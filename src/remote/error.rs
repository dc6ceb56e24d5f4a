use std::time::Duration;

/// Error returned by a remote relation mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The backend refused the mutation (constraint, policy, bad input).
    #[error("remote rejected mutation: {0}")]
    Rejected(String),
    /// The relation row already exists.
    #[error("relation already exists")]
    Duplicate,
    /// The request never reached the backend or the response was lost.
    #[error("network failure: {0}")]
    Network(String),
    /// The session is missing or expired.
    #[error("unauthorized")]
    Unauthorized,
    /// The call did not complete within the configured timeout.
    #[error("remote call timed out after {0:?}")]
    TimedOut(Duration),
}

impl RemoteError {
    /// The desired end state already holds remotely.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, RemoteError::Duplicate)
    }

    /// Trying again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::TimedOut(_))
    }
}
