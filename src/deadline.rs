//! Absolute deadlines and cooperative cancellation.
//!
//! A verification owns one [`Deadline`]; every blocking step (DNS, socket
//! connect, each SMTP exchange, reputation lookups) derives its own bound from
//! it, so the whole pipeline never outlives the budget the caller granted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Shared flag a caller flips to abort in-flight verifications.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Reason a deadline-bound operation stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("cancelled by caller")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    cancel: CancelToken,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self::with_token(budget, CancelToken::new())
    }

    pub fn with_token(budget: Duration, cancel: CancelToken) -> Self {
        Self {
            at: saturating_after(Instant::now(), budget),
            cancel,
        }
    }

    /// Returns a deadline at most `budget` from now, never later than `self`.
    /// The cancellation token is shared.
    pub fn narrow(&self, budget: Duration) -> Self {
        let candidate = saturating_after(Instant::now(), budget);
        Self {
            at: candidate.min(self.at),
            cancel: self.cancel.clone(),
        }
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Time left before expiry; `None` once expired or cancelled.
    pub fn remaining(&self) -> Option<Duration> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.at
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            Err(Interrupted::Cancelled)
        } else if Instant::now() >= self.at {
            Err(Interrupted::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

fn saturating_after(now: Instant, budget: Duration) -> Instant {
    now.checked_add(budget)
        .unwrap_or_else(|| now + Duration::from_secs(u64::from(u32::MAX)))
}
