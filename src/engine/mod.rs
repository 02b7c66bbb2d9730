//! The verification pipeline.
//!
//! [`DeliverabilityEngine::verify`] runs, in order and stopping at the first
//! terminal signal: syntax, static lists, domain resolution, SMTP probing with
//! fallback over the mail targets, and reputation of the mail server IPs.

mod error;
mod fallback;
mod options;
mod types;

pub use error::VerifyError;
pub use fallback::{FallbackReport, probe_until_definitive};
pub use options::EngineOptions;
pub use types::{Evidence, TargetAttempt, VerdictStatus, VerificationVerdict};

use std::sync::Arc;

use tracing::{debug, info};

use crate::deadline::{CancelToken, Deadline};
use crate::lists::StaticLists;
use crate::mx::{DnsLookup, DomainResolver, ResolverInitError, ResolverOptions, SystemDns};
use crate::reputation::ReputationCache;
use crate::smtp_verify::{MailboxProbe, ProbeStatus, SmtpProbe};
use crate::validator::normalize_email;

pub const REASON_DISPOSABLE: &str = "disposable email domain detected";
pub const REASON_ROLE_ACCOUNT: &str = "role-based account";
pub const REASON_NOT_PROBED: &str = "mailbox not probed";
pub const REASON_ALL_UNCERTAIN: &str = "all SMTP servers returned uncertain results";
pub const REASON_POOR_REPUTATION: &str = "mail server IP has poor reputation";
pub const REASON_NO_MAIL_SERVERS: &str = "no mail servers found for domain";

pub struct DeliverabilityEngine {
    resolver: DomainResolver,
    probe: Arc<dyn MailboxProbe>,
    reputation: Option<Arc<ReputationCache>>,
    lists: StaticLists,
    options: EngineOptions,
}

impl DeliverabilityEngine {
    pub fn new(
        resolver: DomainResolver,
        probe: Arc<dyn MailboxProbe>,
        lists: StaticLists,
        options: EngineOptions,
    ) -> Self {
        Self {
            resolver,
            probe,
            reputation: None,
            lists,
            options,
        }
    }

    /// Engine on the system resolver, probing over TCP with the built-in lists.
    pub fn from_system(
        options: EngineOptions,
        resolver_options: &ResolverOptions,
    ) -> Result<Self, ResolverInitError> {
        let dns: Arc<dyn DnsLookup> = Arc::new(SystemDns::from_system_conf(resolver_options)?);
        let probe = Arc::new(SmtpProbe::new(options.probe.clone(), Arc::clone(&dns)));
        Ok(Self::new(
            DomainResolver::new(dns),
            probe,
            StaticLists::builtin(),
            options,
        ))
    }

    /// Enables reputation augmentation of Valid verdicts.
    pub fn with_reputation(mut self, cache: Arc<ReputationCache>) -> Self {
        self.reputation = Some(cache);
        self
    }

    pub fn with_lists(mut self, lists: StaticLists) -> Self {
        self.lists = lists;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn reputation(&self) -> Option<&Arc<ReputationCache>> {
        self.reputation.as_ref()
    }

    pub fn verify(&self, address: &str) -> Result<VerificationVerdict, VerifyError> {
        self.verify_with_token(address, CancelToken::new())
    }

    /// Like [`verify`](Self::verify), aborting as soon as `token` is
    /// cancelled. A cancelled or expired verification yields an error, never
    /// a partial verdict.
    pub fn verify_with_token(
        &self,
        address: &str,
        token: CancelToken,
    ) -> Result<VerificationVerdict, VerifyError> {
        let deadline = Deadline::with_token(self.options.verification_timeout, token);
        let verdict = self.run(address, &deadline)?;
        info!(email = address, status = %verdict.status, reason = %verdict.reason, "verification finished");
        Ok(verdict)
    }

    fn run(&self, address: &str, deadline: &Deadline) -> Result<VerificationVerdict, VerifyError> {
        deadline.check()?;

        let normalized = normalize_email(address);
        if !normalized.valid {
            let reason = format!("invalid email format: {}", normalized.reasons.join("; "));
            let evidence = Evidence {
                syntax_reasons: normalized.reasons,
                ..Evidence::default()
            };
            return Ok(VerificationVerdict::new(VerdictStatus::Invalid, reason).with_evidence(evidence));
        }

        let domain = normalized.ascii_domain.as_str();
        if self.lists.is_disposable(domain) || self.lists.is_disposable(&normalized.domain) {
            return Ok(VerificationVerdict::new(VerdictStatus::Invalid, REASON_DISPOSABLE));
        }
        if self.lists.is_role_based(&normalized.local) {
            return Ok(VerificationVerdict::new(VerdictStatus::Risky, REASON_ROLE_ACCOUNT));
        }

        deadline.check()?;
        let targets = match self.resolver.resolve(domain) {
            Ok(targets) => targets,
            Err(failure) => {
                debug!(domain, error = %failure, "resolution failed");
                return Ok(VerificationVerdict::new(VerdictStatus::Invalid, failure.reason()));
            }
        };
        deadline.check()?;

        let mut evidence = Evidence {
            targets,
            ..Evidence::default()
        };
        if !self.options.probe_smtp {
            return Ok(VerificationVerdict::new(VerdictStatus::Unknown, REASON_NOT_PROBED)
                .with_evidence(evidence));
        }

        let candidate = normalized.ascii_address();
        let probe_timeout = self.options.probe.timeout;
        let report = probe_until_definitive(&evidence.targets, deadline, |target| {
            self.probe.probe(target, &candidate, probe_timeout, deadline)
        })?;

        let mut verdict = match report.decisive() {
            Some(outcome) if outcome.status == ProbeStatus::Confirmed => {
                VerificationVerdict::new(VerdictStatus::Valid, outcome.reason.clone())
            }
            Some(outcome) => VerificationVerdict::new(VerdictStatus::Invalid, outcome.reason.clone()),
            None => {
                // an interrupted last probe is not an uncertain server
                deadline.check()?;
                VerificationVerdict::new(VerdictStatus::Risky, REASON_ALL_UNCERTAIN)
            }
        };
        evidence.attempts = report.attempts;

        if verdict.status == VerdictStatus::Valid {
            if let Some(cache) = &self.reputation {
                self.augment(cache, &mut verdict, &mut evidence, deadline)?;
            }
        }
        Ok(verdict.with_evidence(evidence))
    }

    /// Downgrades a Valid verdict to Risky when no mail server IP resolves or
    /// one of them is high risk. Provider failures are only noted.
    fn augment(
        &self,
        cache: &ReputationCache,
        verdict: &mut VerificationVerdict,
        evidence: &mut Evidence,
        deadline: &Deadline,
    ) -> Result<(), VerifyError> {
        evidence.mail_server_ips = self.resolver.mail_server_ips(&evidence.targets, deadline);
        if evidence.mail_server_ips.is_empty() {
            deadline.check()?;
            evidence
                .notes
                .push("no mail server IP resolved for reputation check".to_string());
            verdict.status = VerdictStatus::Risky;
            verdict.reason = REASON_NO_MAIL_SERVERS.to_string();
            return Ok(());
        }

        for ip in &evidence.mail_server_ips {
            deadline.check()?;
            let record = cache.lookup(&ip.to_string());
            if let Some(err) = &record.error {
                evidence
                    .notes
                    .push(format!("reputation unavailable for {ip}: {err}"));
            }
            evidence.reputation.push(record);
        }

        let policy = &self.options.reputation;
        if let Some(flagged) = evidence.reputation.iter().find(|r| policy.is_high_risk(r)) {
            debug!(ip = %flagged.ip, score = flagged.confidence_score, reports = flagged.total_reports, "poor mail server reputation");
            verdict.status = VerdictStatus::Risky;
            verdict.reason = REASON_POOR_REPUTATION.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
