use std::time::Duration;

use crate::reputation::ReputationPolicy;
use crate::smtp_verify::ProbeOptions;

/// Tuning knobs of [`DeliverabilityEngine`](super::DeliverabilityEngine).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Budget of one whole verification, resolution and probing included.
    pub verification_timeout: Duration,
    /// When false the pipeline stops after resolution with `Unknown`.
    pub probe_smtp: bool,
    pub probe: ProbeOptions,
    pub reputation: ReputationPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            verification_timeout: Duration::from_secs(60),
            probe_smtp: true,
            probe: ProbeOptions::default(),
            reputation: ReputationPolicy::default(),
        }
    }
}
