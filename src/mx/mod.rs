//! Domain to mail-exchanger resolution.
//!
//! [`DomainResolver::resolve`] returns the MX hosts of a domain ordered by
//! ascending priority, falling back to the implicit MX (the domain itself)
//! when the domain publishes address records but no MX.

mod error;
mod resolver;
mod types;

pub use error::{LookupError, ResolveFailure, ResolverInitError};
pub use resolver::{DnsLookup, ResolverOptions, SystemDns};
pub use types::MailTarget;

use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use crate::deadline::Deadline;
use resolver::order_targets;

#[derive(Clone)]
pub struct DomainResolver {
    dns: Arc<dyn DnsLookup>,
}

impl DomainResolver {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }

    /// Resolves `domain` (ASCII form) to its ordered mail targets.
    ///
    /// Only the absence of both MX and address records is reported as
    /// [`ResolveFailure::DomainNotFound`].
    pub fn resolve(&self, domain: &str) -> Result<Vec<MailTarget>, ResolveFailure> {
        match self.dns.lookup_mx(domain) {
            Ok(records) => {
                let targets = order_targets(records);
                if !targets.is_empty() {
                    debug!(domain, targets = targets.len(), "using MX targets");
                    return Ok(targets);
                }
            }
            Err(LookupError::NoRecords) => {}
            Err(err) => return Err(ResolveFailure::from_lookup(domain, err)),
        }

        // RFC 5321 §5.1: implicit MX on the domain's own address records.
        match self.dns.lookup_ips(domain) {
            Ok(ips) if !ips.is_empty() => {
                debug!(domain, "no MX records, falling back to implicit MX");
                Ok(vec![MailTarget::new(domain, 0)])
            }
            Ok(_) => Err(ResolveFailure::from_lookup(domain, LookupError::NoRecords)),
            Err(err) => Err(ResolveFailure::from_lookup(domain, err)),
        }
    }

    /// Distinct addresses of every target host, in first-seen order. Hosts that
    /// fail to resolve are skipped; lookups stop once `deadline` runs out.
    pub fn mail_server_ips(&self, targets: &[MailTarget], deadline: &Deadline) -> Vec<IpAddr> {
        let mut ips = Vec::new();
        for target in targets {
            if deadline.check().is_err() {
                break;
            }
            match self.dns.lookup_ips(&target.host) {
                Ok(found) => {
                    for ip in found {
                        if !ips.contains(&ip) {
                            ips.push(ip);
                        }
                    }
                }
                Err(err) => debug!(host = %target.host, error = %err, "skipping unresolvable mail host"),
            }
        }
        ips
    }
}
