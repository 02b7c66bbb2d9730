use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;
use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
    proto::op::ResponseCode,
    system_conf,
};

use super::{LookupError, MailTarget, ResolverInitError};

/// DNS queries the engine needs. Implemented by [`SystemDns`]; tests provide stubs.
pub trait DnsLookup: Send + Sync {
    /// MX records for `domain`, in the order the server returned them.
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MailTarget>, LookupError>;

    /// A/AAAA records for `host`.
    fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;
}

/// Tuning applied on top of the system resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub timeout: Duration,
    pub attempts: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

/// Synchronous resolver built from the host's `resolv.conf` (or platform equivalent).
pub struct SystemDns {
    resolver: Resolver,
}

impl SystemDns {
    pub fn from_system_conf(options: &ResolverOptions) -> Result<Self, ResolverInitError> {
        let (config, mut opts) = system_conf::read_system_conf().map_err(ResolverInitError::new)?;
        opts.timeout = options.timeout;
        opts.attempts = options.attempts;
        let resolver = Resolver::new(config, opts).map_err(ResolverInitError::new)?;
        Ok(Self { resolver })
    }
}

impl DnsLookup for SystemDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MailTarget>, LookupError> {
        let lookup = self.resolver.mx_lookup(domain).map_err(classify)?;
        let records = lookup
            .iter()
            .map(|mx| MailTarget::new(normalize_exchange(&mx.exchange().to_utf8()), mx.preference()))
            .collect::<Vec<_>>();
        debug!(domain, count = records.len(), "MX lookup answered");
        Ok(records)
    }

    fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let lookup = self.resolver.lookup_ip(host).map_err(classify)?;
        let ips = lookup.iter().collect::<Vec<_>>();
        debug!(host, count = ips.len(), "address lookup answered");
        Ok(ips)
    }
}

fn classify(err: ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NXDomain =>
        {
            LookupError::NxDomain
        }
        ResolveErrorKind::NoRecordsFound { .. } => LookupError::NoRecords,
        ResolveErrorKind::Timeout => LookupError::Timeout,
        _ => LookupError::Other(err.to_string()),
    }
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    let trimmed = exchange.trim().trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// Drops null-MX/empty hosts and exact duplicates, then sorts by ascending
/// priority. The sort is stable: ties keep the order DNS returned them in.
pub(crate) fn order_targets(records: Vec<MailTarget>) -> Vec<MailTarget> {
    let mut targets: Vec<MailTarget> = Vec::with_capacity(records.len());
    for record in records {
        let record = MailTarget::new(normalize_exchange(&record.host), record.priority);
        if record.host.is_empty() || targets.contains(&record) {
            continue;
        }
        targets.push(record);
    }
    targets.sort_by_key(|target| target.priority);
    targets
}
