//! Mail server IP reputation.
//!
//! [`ReputationCache`] sits in front of a [`ReputationProvider`] (AbuseIPDB
//! with the `with-abuseipdb` feature) and is the only state shared between
//! concurrent verifications.

#[cfg(feature = "with-abuseipdb")]
pub mod abuseipdb;
mod cache;
mod clock;
mod error;
mod provider;
mod sweeper;
mod types;

#[cfg(feature = "with-abuseipdb")]
pub use abuseipdb::AbuseIpDbClient;
pub use cache::ReputationCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ReputationError;
pub use provider::ReputationProvider;
pub use sweeper::{SweeperHandle, spawn_sweeper};
pub use types::{
    CacheStats, ReputationOptions, ReputationPolicy, ReputationRecord, ReputationReport,
};
