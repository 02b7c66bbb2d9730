use thiserror::Error;

use crate::deadline::Interrupted;

/// Errors a verification can surface. Everything else ends up in the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("verification cancelled")]
    Cancelled,
    #[error("verification deadline exceeded")]
    DeadlineExceeded,
    #[error("worker pool unavailable: {message}")]
    Pool { message: String },
}

impl VerifyError {
    pub(crate) fn pool<E: std::fmt::Display>(err: E) -> Self {
        Self::Pool {
            message: err.to_string(),
        }
    }
}

impl From<Interrupted> for VerifyError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
