use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Single-server classification of a probed mailbox.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The server accepted the recipient.
    Confirmed,
    /// The server answered with an explicit "no such mailbox" code.
    Rejected,
    /// Anything else: connection trouble, greylisting, policy rejections.
    Inconclusive,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Rejected => f.write_str("rejected"),
            Self::Inconclusive => f.write_str("inconclusive"),
        }
    }
}

/// Result of probing one target. `code` is 0 when no reply code was obtained.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub code: u16,
    pub reason: String,
}

impl ProbeOutcome {
    pub fn new(status: ProbeStatus, code: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            code,
            reason: reason.into(),
        }
    }

    pub fn confirmed(code: u16, reason: impl Into<String>) -> Self {
        Self::new(ProbeStatus::Confirmed, code, reason)
    }

    pub fn rejected(code: u16, reason: impl Into<String>) -> Self {
        Self::new(ProbeStatus::Rejected, code, reason)
    }

    pub fn inconclusive(code: u16, reason: impl Into<String>) -> Self {
        Self::new(ProbeStatus::Inconclusive, code, reason)
    }

    /// Confirmed and Rejected end the fallback over mail targets.
    pub fn is_definitive(&self) -> bool {
        matches!(self.status, ProbeStatus::Confirmed | ProbeStatus::Rejected)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.status, self.code, self.reason)
    }
}
