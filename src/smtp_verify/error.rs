use std::io;

use thiserror::Error;

/// Transport-level failures inside one SMTP session. These never escape the
/// probe: each is folded into an inconclusive [`ProbeOutcome`](super::ProbeOutcome).
#[derive(Debug, Error)]
pub(crate) enum SmtpVerifyError {
    #[error("connection to {host} failed: {message}")]
    Connect { host: String, message: String },
    #[error("SMTP exchange timed out")]
    Timeout,
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SmtpVerifyError {
    pub(crate) fn connect(host: &str, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn from_io(source: io::Error) -> Self {
        if is_timeout(&source) {
            Self::Timeout
        } else {
            Self::Io { source }
        }
    }
}

pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
