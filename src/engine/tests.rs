use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use super::*;
use crate::mx::LookupError;
use crate::mx::MailTarget;
use crate::mx::tests::StubDns;
use crate::reputation::tests::FakeProvider;
use crate::reputation::{ManualClock, ReputationError, ReputationOptions};
use crate::smtp_verify::{ProbeOutcome, reasons};

/// Answers per host from a table and records the order of probed hosts.
/// Unknown hosts cannot be reached.
#[derive(Default)]
struct ScriptedProbe {
    answers: HashMap<String, ProbeOutcome>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    fn new() -> Self {
        Self::default()
    }

    fn answer(mut self, host: &str, outcome: ProbeOutcome) -> Self {
        self.answers.insert(host.to_string(), outcome);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MailboxProbe for ScriptedProbe {
    fn probe(
        &self,
        target: &MailTarget,
        _candidate: &str,
        _timeout: Duration,
        _deadline: &Deadline,
    ) -> ProbeOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.host.clone());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.answers
            .get(&target.host)
            .cloned()
            .unwrap_or_else(|| ProbeOutcome::inconclusive(0, reasons::COULD_NOT_CONNECT))
    }
}

fn confirmed() -> ProbeOutcome {
    ProbeOutcome::confirmed(250, reasons::MAILBOX_CONFIRMED)
}

fn rejected() -> ProbeOutcome {
    ProbeOutcome::rejected(550, reasons::MAILBOX_MISSING)
}

fn timed_out() -> ProbeOutcome {
    ProbeOutcome::inconclusive(0, reasons::TIMEOUT)
}

fn example_mx_dns() -> StubDns {
    StubDns::new()
        .mx(
            "example-mx.test",
            &[("mail2.example-mx.test", 20), ("mail1.example-mx.test", 10)],
        )
        .ips("mail1.example-mx.test", &["192.0.2.10"])
        .ips("mail2.example-mx.test", &["192.0.2.20"])
}

struct Harness {
    dns: Arc<StubDns>,
    probe: Arc<ScriptedProbe>,
    engine: DeliverabilityEngine,
}

fn harness(dns: StubDns, probe: ScriptedProbe, options: EngineOptions) -> Harness {
    let dns = Arc::new(dns);
    let probe = Arc::new(probe);
    let engine = DeliverabilityEngine::new(
        DomainResolver::new(dns.clone()),
        probe.clone(),
        StaticLists::builtin(),
        options,
    );
    Harness { dns, probe, engine }
}

fn reputation_cache(provider: Arc<FakeProvider>) -> Arc<ReputationCache> {
    Arc::new(ReputationCache::with_clock(
        provider,
        ReputationOptions::default(),
        Arc::new(ManualClock::default()),
    ))
}

#[test]
fn malformed_address_is_invalid_without_network() {
    let h = harness(StubDns::new(), ScriptedProbe::new(), EngineOptions::default());

    let verdict = h.engine.verify("a..b@example.com").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert!(verdict.reason.starts_with("invalid email format"));
    let evidence = verdict.evidence.expect("evidence");
    assert!(!evidence.syntax_reasons.is_empty());
    assert!(h.dns.queries().is_empty());
    assert!(h.probe.calls().is_empty());
}

proptest! {
    #[test]
    fn addresses_without_at_sign_never_touch_the_network(input in "[a-zA-Z0-9._+-]{0,40}") {
        let h = harness(StubDns::new(), ScriptedProbe::new(), EngineOptions::default());
        let verdict = h.engine.verify(&input).expect("verdict");
        prop_assert_eq!(verdict.status, VerdictStatus::Invalid);
        prop_assert!(h.dns.queries().is_empty());
        prop_assert!(h.probe.calls().is_empty());
    }
}

#[test]
fn disposable_domain_is_invalid() {
    let h = harness(StubDns::new(), ScriptedProbe::new(), EngineOptions::default());
    let verdict = h.engine.verify("someone@Mailinator.com").expect("verdict");
    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(verdict.reason, REASON_DISPOSABLE);
    assert!(h.dns.queries().is_empty());
}

#[test]
fn role_account_is_risky() {
    let h = harness(example_mx_dns(), ScriptedProbe::new(), EngineOptions::default());
    let verdict = h.engine.verify("postmaster@example-mx.test").expect("verdict");
    assert_eq!(verdict.status, VerdictStatus::Risky);
    assert_eq!(verdict.reason, REASON_ROLE_ACCOUNT);
    assert!(h.probe.calls().is_empty());
}

#[test]
fn custom_lists_replace_builtin_ones() {
    let h = harness(example_mx_dns(), ScriptedProbe::new(), EngineOptions::default());
    let engine = h
        .engine
        .with_lists(StaticLists::default().with_disposable("example-mx.test"));
    let verdict = engine.verify("user@example-mx.test").expect("verdict");
    assert_eq!(verdict.reason, REASON_DISPOSABLE);
}

#[test]
fn dead_domain_is_invalid_without_smtp() {
    let h = harness(StubDns::new(), ScriptedProbe::new(), EngineOptions::default());

    let verdict = h.engine.verify("bounce@dead-domain.test").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(verdict.reason, "domain does not exist");
    assert!(h.probe.calls().is_empty());
}

#[test]
fn domain_without_mx_or_address_is_invalid() {
    let dns = StubDns::new()
        .mx_error("parked.test", LookupError::NoRecords)
        .ips_error("parked.test", LookupError::NoRecords);
    let h = harness(dns, ScriptedProbe::new(), EngineOptions::default());

    let verdict = h.engine.verify("user@parked.test").expect("verdict");
    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(verdict.reason, "domain does not exist");
}

#[test]
fn resolver_timeout_is_invalid_with_its_reason() {
    let dns = StubDns::new().mx_error("slow.test", LookupError::Timeout);
    let h = harness(dns, ScriptedProbe::new(), EngineOptions::default());
    let verdict = h.engine.verify("user@slow.test").expect("verdict");
    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(verdict.reason, "DNS lookup timeout");
}

#[test]
fn targets_are_probed_in_priority_order_until_uncertain_exhaustion() {
    let dns = StubDns::new().mx(
        "example.com",
        &[("mx3.example.com", 30), ("mx1.example.com", 10), ("mx2.example.com", 20)],
    );
    let probe = ScriptedProbe::new()
        .answer("mx1.example.com", timed_out())
        .answer("mx2.example.com", ProbeOutcome::inconclusive(450, reasons::TEMPORARY))
        .answer("mx3.example.com", ProbeOutcome::inconclusive(552, reasons::MAILBOX_FULL));
    let h = harness(dns, probe, EngineOptions::default());

    let verdict = h.engine.verify("user@example.com").expect("verdict");

    assert_eq!(
        h.probe.calls(),
        vec!["mx1.example.com", "mx2.example.com", "mx3.example.com"]
    );
    assert_eq!(verdict.status, VerdictStatus::Risky);
    assert_eq!(verdict.reason, REASON_ALL_UNCERTAIN);
    assert_eq!(verdict.evidence.expect("evidence").attempts.len(), 3);
}

#[test]
fn first_rejection_is_authoritative() {
    let dns = StubDns::new().mx(
        "example.com",
        &[("mx1.example.com", 10), ("mx2.example.com", 20), ("mx3.example.com", 30)],
    );
    let probe = ScriptedProbe::new()
        .answer("mx1.example.com", timed_out())
        .answer("mx2.example.com", rejected())
        .answer("mx3.example.com", confirmed());
    let h = harness(dns, probe, EngineOptions::default());

    let verdict = h.engine.verify("ghost@example.com").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(verdict.reason, reasons::MAILBOX_MISSING);
    assert_eq!(h.probe.calls(), vec!["mx1.example.com", "mx2.example.com"]);
}

#[test]
fn fallback_to_second_server_confirms() {
    let probe = ScriptedProbe::new()
        .answer("mail1.example-mx.test", timed_out())
        .answer("mail2.example-mx.test", confirmed());
    let h = harness(example_mx_dns(), probe, EngineOptions::default());

    let verdict = h.engine.verify("user@example-mx.test").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Valid);
    let evidence = verdict.evidence.expect("evidence");
    let hosts: Vec<_> = evidence.attempts.iter().map(|a| a.target.host.as_str()).collect();
    assert_eq!(hosts, vec!["mail1.example-mx.test", "mail2.example-mx.test"]);
    assert_eq!(evidence.attempts[0].outcome, timed_out());
    assert_eq!(evidence.attempts[1].outcome.code, 250);
}

#[test]
fn probing_disabled_yields_unknown() {
    let options = EngineOptions {
        probe_smtp: false,
        ..EngineOptions::default()
    };
    let h = harness(example_mx_dns(), ScriptedProbe::new(), options);

    let verdict = h.engine.verify("user@example-mx.test").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Unknown);
    assert_eq!(verdict.reason, REASON_NOT_PROBED);
    assert_eq!(verdict.evidence.expect("evidence").targets.len(), 2);
    assert!(h.probe.calls().is_empty());
}

#[test]
fn poor_reputation_downgrades_valid_to_risky() {
    let dns = StubDns::new()
        .mx("example.com", &[("mx.example.com", 10)])
        .ips("mx.example.com", &["192.0.2.66"]);
    let probe = ScriptedProbe::new().answer("mx.example.com", confirmed());
    let provider = Arc::new(FakeProvider::new().score("192.0.2.66", 90, 3));
    let h = harness(dns, probe, EngineOptions::default());
    let engine = h.engine.with_reputation(reputation_cache(provider));

    let verdict = engine.verify("user@example.com").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Risky);
    assert_eq!(verdict.reason, REASON_POOR_REPUTATION);
    let evidence = verdict.evidence.expect("evidence");
    assert_eq!(evidence.reputation.len(), 1);
    assert_eq!(evidence.reputation[0].ip, "192.0.2.66");
    assert_eq!(evidence.reputation[0].confidence_score, 90);
}

#[test]
fn clean_reputation_keeps_valid_and_is_cached_across_calls() {
    let probe = ScriptedProbe::new()
        .answer("mail1.example-mx.test", confirmed());
    let provider = Arc::new(
        FakeProvider::new()
            .score("192.0.2.10", 0, 0)
            .score("192.0.2.20", 10, 1),
    );
    let h = harness(example_mx_dns(), probe, EngineOptions::default());
    let engine = h.engine.with_reputation(reputation_cache(provider.clone()));

    for _ in 0..2 {
        let verdict = engine.verify("user@example-mx.test").expect("verdict");
        assert_eq!(verdict.status, VerdictStatus::Valid);
        assert_eq!(verdict.evidence.expect("evidence").mail_server_ips.len(), 2);
    }
    assert_eq!(provider.calls_for("192.0.2.10"), 1);
    assert_eq!(provider.calls_for("192.0.2.20"), 1);
}

#[test]
fn reputation_failure_is_noted_but_never_downgrades() {
    let dns = StubDns::new()
        .mx("example.com", &[("mx.example.com", 10)])
        .ips("mx.example.com", &["192.0.2.5"]);
    let probe = ScriptedProbe::new().answer("mx.example.com", confirmed());
    let provider = Arc::new(FakeProvider::new().failing("192.0.2.5", ReputationError::Timeout));
    let h = harness(dns, probe, EngineOptions::default());
    let engine = h.engine.with_reputation(reputation_cache(provider));

    let verdict = engine.verify("user@example.com").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Valid);
    let evidence = verdict.evidence.expect("evidence");
    assert!(evidence.reputation[0].is_error());
    assert_eq!(evidence.notes.len(), 1);
    assert!(evidence.notes[0].contains("192.0.2.5"));
}

#[test]
fn no_mail_server_ip_downgrades_to_risky() {
    let dns = StubDns::new().mx("example.com", &[("mx.example.com", 10)]);
    let probe = ScriptedProbe::new().answer("mx.example.com", confirmed());
    let provider = Arc::new(FakeProvider::new());
    let h = harness(dns, probe, EngineOptions::default());
    let engine = h.engine.with_reputation(reputation_cache(provider.clone()));

    let verdict = engine.verify("user@example.com").expect("verdict");

    assert_eq!(verdict.status, VerdictStatus::Risky);
    assert_eq!(verdict.reason, REASON_NO_MAIL_SERVERS);
    let evidence = verdict.evidence.expect("evidence");
    assert!(evidence.mail_server_ips.is_empty());
    assert_eq!(evidence.notes.len(), 1);
    assert_eq!(evidence.attempts.len(), 1);
    assert_eq!(provider.total_calls(), 0);
}

#[test]
fn reputation_is_not_consulted_for_invalid_verdicts() {
    let dns = StubDns::new()
        .mx("example.com", &[("mx.example.com", 10)])
        .ips("mx.example.com", &["192.0.2.66"]);
    let probe = ScriptedProbe::new().answer("mx.example.com", rejected());
    let provider = Arc::new(FakeProvider::new().score("192.0.2.66", 90, 3));
    let h = harness(dns, probe, EngineOptions::default());
    let engine = h.engine.with_reputation(reputation_cache(provider.clone()));

    let verdict = engine.verify("user@example.com").expect("verdict");
    assert_eq!(verdict.status, VerdictStatus::Invalid);
    assert_eq!(provider.total_calls(), 0);
}

#[test]
fn cancelled_token_is_an_error_not_a_verdict() {
    let h = harness(example_mx_dns(), ScriptedProbe::new(), EngineOptions::default());
    let token = CancelToken::new();
    token.cancel();

    let err = h
        .engine
        .verify_with_token("user@example-mx.test", token)
        .expect_err("cancelled");
    assert_eq!(err, VerifyError::Cancelled);
    assert!(h.dns.queries().is_empty());
}

#[test]
fn expired_budget_stops_the_fallback() {
    let probe = ScriptedProbe::new()
        .answer("mail1.example-mx.test", timed_out())
        .answer("mail2.example-mx.test", confirmed())
        .slow(Duration::from_millis(150));
    let options = EngineOptions {
        verification_timeout: Duration::from_millis(100),
        ..EngineOptions::default()
    };
    let h = harness(example_mx_dns(), probe, options);

    let err = h
        .engine
        .verify("user@example-mx.test")
        .expect_err("deadline");
    assert_eq!(err, VerifyError::DeadlineExceeded);
    assert_eq!(h.probe.calls(), vec!["mail1.example-mx.test"]);
}
