use std::fmt;
use std::net::IpAddr;

use crate::mx::MailTarget;
use crate::reputation::ReputationRecord;
use crate::smtp_verify::ProbeOutcome;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Valid,
    Invalid,
    Risky,
    Unknown,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Risky => "risky",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One probe in the fallback sequence.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAttempt {
    pub target: MailTarget,
    pub outcome: ProbeOutcome,
}

/// What the pipeline saw on its way to the verdict.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    pub syntax_reasons: Vec<String>,
    pub targets: Vec<MailTarget>,
    pub attempts: Vec<TargetAttempt>,
    pub mail_server_ips: Vec<IpAddr>,
    pub reputation: Vec<ReputationRecord>,
    /// Diagnostics that did not change the status (provider failures, no IP).
    pub notes: Vec<String>,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationVerdict {
    pub status: VerdictStatus,
    pub reason: String,
    pub evidence: Option<Evidence>,
}

impl VerificationVerdict {
    pub fn new(status: VerdictStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }
}
