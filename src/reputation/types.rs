use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// What a provider knows about one IP address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReputationReport {
    pub ip: String,
    /// 0..=100
    pub confidence_score: u8,
    pub total_reports: u32,
    pub is_whitelisted: bool,
    pub country_code: Option<String>,
    pub isp: Option<String>,
    pub domain: Option<String>,
    pub last_reported_at: Option<DateTime<Utc>>,
}

impl ReputationReport {
    pub fn new(ip: impl Into<String>, confidence_score: u8, total_reports: u32) -> Self {
        Self {
            ip: ip.into(),
            confidence_score: confidence_score.min(100),
            total_reports,
            ..Self::default()
        }
    }
}

/// A cached lookup result, successful or not.
///
/// Failed lookups carry `error` and zeroed scores; they are cached like any
/// other record so a misbehaving provider is not hammered.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationRecord {
    pub ip: String,
    pub confidence_score: u8,
    pub total_reports: u32,
    pub is_whitelisted: bool,
    pub country_code: Option<String>,
    pub isp: Option<String>,
    pub domain: Option<String>,
    pub last_reported_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl ReputationRecord {
    pub fn from_report(ip: &str, report: ReputationReport, fetched_at: DateTime<Utc>) -> Self {
        Self {
            ip: ip.to_string(),
            confidence_score: report.confidence_score.min(100),
            total_reports: report.total_reports,
            is_whitelisted: report.is_whitelisted,
            country_code: report.country_code,
            isp: report.isp,
            domain: report.domain,
            last_reported_at: report.last_reported_at,
            fetched_at,
            error: None,
        }
    }

    pub fn from_error(ip: &str, error: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            ip: ip.to_string(),
            confidence_score: 0,
            total_reports: 0,
            is_whitelisted: false,
            country_code: None,
            isp: None,
            domain: None,
            last_reported_at: None,
            fetched_at,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// A record is fresh while its age is strictly below `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match TimeDelta::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.fetched_at) < ttl,
            Err(_) => true,
        }
    }
}

/// Thresholds above which a mail server IP downgrades a verdict.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationPolicy {
    pub max_confidence_score: u8,
    pub max_total_reports: u32,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            max_confidence_score: 75,
            max_total_reports: 50,
        }
    }
}

impl ReputationPolicy {
    /// Failed lookups are never high risk.
    pub fn is_high_risk(&self, record: &ReputationRecord) -> bool {
        !record.is_error()
            && (record.confidence_score > self.max_confidence_score
                || record.total_reports > self.max_total_reports)
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationOptions {
    pub ttl: Duration,
    pub provider_timeout: Duration,
}

impl Default for ReputationOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            provider_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub ttl: Duration,
}
