use std::time::Duration;

use super::{ReputationError, ReputationReport};

/// External IP reputation source.
///
/// `timeout` bounds the whole call; implementations must not block longer.
pub trait ReputationProvider: Send + Sync {
    fn check_ip(&self, ip: &str, timeout: Duration) -> Result<ReputationReport, ReputationError>;
}
