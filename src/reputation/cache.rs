use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::provider::ReputationProvider;
use super::types::{CacheStats, ReputationOptions, ReputationRecord};

/// TTL cache in front of a [`ReputationProvider`], shared by every
/// verification.
///
/// Entries live in a sharded map: a write for one IP never blocks readers of
/// another. Concurrent misses on the same IP may each call the provider; the
/// stored record is always the one fetched last.
pub struct ReputationCache {
    provider: Arc<dyn ReputationProvider>,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, ReputationRecord>,
    options: ReputationOptions,
}

impl ReputationCache {
    pub fn new(provider: Arc<dyn ReputationProvider>, options: ReputationOptions) -> Self {
        Self::with_clock(provider, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn ReputationProvider>,
        options: ReputationOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            clock,
            entries: DashMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &ReputationOptions {
        &self.options
    }

    /// Returns the cached record for `ip` while it is fresh, otherwise asks
    /// the provider and caches whatever comes back, failures included.
    pub fn lookup(&self, ip: &str) -> ReputationRecord {
        if let Some(record) = self.fresh(ip, self.clock.now()) {
            debug!(ip, "reputation cache hit");
            return record;
        }

        let record = match self.provider.check_ip(ip, self.options.provider_timeout) {
            Ok(report) => {
                debug!(ip, score = report.confidence_score, reports = report.total_reports, "reputation fetched");
                ReputationRecord::from_report(ip, report, self.clock.now())
            }
            Err(err) => {
                warn!(ip, error = %err, "reputation provider failed");
                ReputationRecord::from_error(ip, err.to_string(), self.clock.now())
            }
        };
        self.store(ip, record.clone());
        record
    }

    /// Removes every entry whose age reached the TTL and returns how many
    /// were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.options.ttl;
        let mut removed = 0;
        self.entries.retain(|_, record| {
            let keep = record.is_fresh(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ttl: self.options.ttl,
        }
    }

    fn fresh(&self, ip: &str, now: DateTime<Utc>) -> Option<ReputationRecord> {
        self.entries
            .get(ip)
            .filter(|entry| entry.is_fresh(now, self.options.ttl))
            .map(|entry| entry.value().clone())
    }

    // last fetch wins
    fn store(&self, ip: &str, record: ReputationRecord) {
        match self.entries.entry(ip.to_string()) {
            Entry::Occupied(mut slot) => {
                if slot.get().fetched_at <= record.fetched_at {
                    slot.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }
}
