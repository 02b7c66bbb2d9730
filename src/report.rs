//! Job and result records exchanged with whatever transports the verdicts
//! (queue, HTTP, files).

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::engine::{Evidence, VerdictStatus, VerificationVerdict, VerifyError};

/// One address to verify.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationJob {
    pub job_id: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

impl ValidationJob {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            job_id: new_job_id(),
            email: email.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Random 64-bit identifier rendered as 16 hex digits.
pub fn new_job_id() -> String {
    format!("{:016x}", rand::thread_rng().r#gen::<u64>())
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Valid,
    Invalid,
    Risky,
    Unknown,
    /// The verification was cancelled or ran out of time.
    Error,
}

impl From<VerdictStatus> for ResultStatus {
    fn from(value: VerdictStatus) -> Self {
        match value {
            VerdictStatus::Valid => Self::Valid,
            VerdictStatus::Invalid => Self::Invalid,
            VerdictStatus::Risky => Self::Risky,
            VerdictStatus::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::Risky => "RISKY",
            Self::Unknown => "UNKNOWN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub job_id: String,
    pub email: String,
    pub status: ResultStatus,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub evidence: Option<Evidence>,
}

impl VerificationResult {
    pub fn from_verdict(job: &ValidationJob, verdict: VerificationVerdict) -> Self {
        Self {
            job_id: job.job_id.clone(),
            email: job.email.clone(),
            status: verdict.status.into(),
            reason: verdict.reason,
            timestamp: Utc::now(),
            evidence: verdict.evidence,
        }
    }

    pub fn from_error(job: &ValidationJob, err: &VerifyError) -> Self {
        Self {
            job_id: job.job_id.clone(),
            email: job.email.clone(),
            status: ResultStatus::Error,
            reason: err.to_string(),
            timestamp: Utc::now(),
            evidence: None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.status == ResultStatus::Invalid
    }
}
