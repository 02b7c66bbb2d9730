#![forbid(unsafe_code)]
//! mailprobe_lib: vérification de délivrabilité e-mail.
//!
//! An address goes through syntax checks, static lists, MX resolution, an
//! SMTP probe of each mail server (first definitive answer wins) and a
//! reputation check of the mail server IPs. [`DeliverabilityEngine::verify`]
//! is the entry point; [`VerifierPool`] runs many of them in parallel.

pub mod deadline;
pub mod engine;
pub mod lists;
pub mod mx;
pub mod pool;
pub mod report;
pub mod reputation;
pub mod smtp_verify;
pub mod validator;

pub use deadline::{CancelToken, Deadline, Interrupted};
pub use engine::{
    DeliverabilityEngine, EngineOptions, Evidence, FallbackReport, TargetAttempt, VerdictStatus,
    VerificationVerdict, VerifyError, probe_until_definitive,
};
pub use lists::StaticLists;
pub use mx::{
    DnsLookup, DomainResolver, LookupError, MailTarget, ResolveFailure, ResolverInitError,
    ResolverOptions, SystemDns,
};
pub use pool::VerifierPool;
pub use report::{ResultStatus, ValidationJob, VerificationResult, new_job_id};
#[cfg(feature = "with-abuseipdb")]
pub use reputation::AbuseIpDbClient;
pub use reputation::{
    CacheStats, Clock, ManualClock, ReputationCache, ReputationError, ReputationOptions,
    ReputationPolicy, ReputationProvider, ReputationRecord, ReputationReport, SweeperHandle,
    SystemClock, spawn_sweeper,
};
pub use smtp_verify::{
    MailboxProbe, ProbeOptions, ProbeOutcome, ProbeStatus, SmtpProbe, analyze_response,
};
pub use validator::{NormalizedEmail, ValidationReport, normalize_email, validate_email};
