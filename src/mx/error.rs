use thiserror::Error;

/// Terminal resolution failures surfaced by [`DomainResolver::resolve`](super::DomainResolver::resolve).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    #[error("domain {domain} does not exist")]
    DomainNotFound { domain: String },
    #[error("DNS lookup for {domain} timed out")]
    LookupTimeout { domain: String },
    #[error("DNS lookup for {domain} failed: {message}")]
    ResolutionFailed { domain: String, message: String },
}

impl ResolveFailure {
    pub(crate) fn from_lookup(domain: &str, err: LookupError) -> Self {
        let domain = domain.to_string();
        match err {
            LookupError::NxDomain | LookupError::NoRecords => Self::DomainNotFound { domain },
            LookupError::Timeout => Self::LookupTimeout { domain },
            LookupError::Other(message) => Self::ResolutionFailed { domain, message },
        }
    }

    /// Short reason suitable for a verdict.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DomainNotFound { .. } => "domain does not exist",
            Self::LookupTimeout { .. } => "DNS lookup timeout",
            Self::ResolutionFailed { .. } => "failed to lookup MX records",
        }
    }
}

/// Raw outcome of a single DNS query, as reported by a [`DnsLookup`](super::DnsLookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("name does not exist")]
    NxDomain,
    #[error("no records of the requested type")]
    NoRecords,
    #[error("lookup timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("resolver initialization failed: {message}")]
pub struct ResolverInitError {
    message: String,
}

impl ResolverInitError {
    pub(crate) fn new<E: std::fmt::Display>(err: E) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}
