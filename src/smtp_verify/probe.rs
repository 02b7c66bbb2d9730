use std::net::{IpAddr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::deadline::Deadline;
use crate::mx::{DnsLookup, MailTarget};
use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::session::{Connector, Session};
use crate::smtp_verify::types::ProbeOutcome;
use crate::smtp_verify::wire::READ_SLICE;

/// Asks one mail server whether it would accept a recipient.
///
/// Implementations never fail: every transport problem is reported as an
/// inconclusive outcome. The session is bounded by both `timeout` and the
/// caller's `deadline`, whichever comes first.
pub trait MailboxProbe: Send + Sync {
    fn probe(
        &self,
        target: &MailTarget,
        candidate: &str,
        timeout: Duration,
        deadline: &Deadline,
    ) -> ProbeOutcome;
}

/// [`MailboxProbe`] speaking SMTP over plain TCP.
pub struct SmtpProbe {
    options: ProbeOptions,
    connector: TcpConnector,
}

impl SmtpProbe {
    pub fn new(options: ProbeOptions, dns: Arc<dyn DnsLookup>) -> Self {
        Self {
            options,
            connector: TcpConnector { dns },
        }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }
}

impl MailboxProbe for SmtpProbe {
    fn probe(
        &self,
        target: &MailTarget,
        candidate: &str,
        timeout: Duration,
        deadline: &Deadline,
    ) -> ProbeOutcome {
        let session = Session::new(
            &self.connector,
            target,
            candidate,
            &self.options,
            deadline.narrow(timeout),
        );
        let outcome = session.run();
        debug!(host = %target.host, candidate, %outcome, "probe finished");
        outcome
    }
}

/// Resolves the target host (unless it is an IP literal) and tries each
/// address until one accepts the connection.
pub(crate) struct TcpConnector {
    dns: Arc<dyn DnsLookup>,
}

impl TcpConnector {
    /// The blocking resolver cannot see the session deadline, so the lookup
    /// runs on its own thread and is abandoned once the deadline passes.
    fn lookup_within(&self, host: &str, deadline: &Deadline) -> Result<Vec<IpAddr>, SmtpVerifyError> {
        let (tx, rx) = mpsc::channel();
        let dns = Arc::clone(&self.dns);
        let owned = host.to_string();
        thread::Builder::new()
            .name("smtp-probe-dns".to_string())
            .spawn(move || {
                // receiver gone means the probe already gave up
                let _ = tx.send(dns.lookup_ips(&owned));
            })
            .map_err(SmtpVerifyError::from_io)?;

        loop {
            let Some(remaining) = deadline.remaining() else {
                debug!(host, "address lookup outlived the probe deadline");
                return Err(SmtpVerifyError::Timeout);
            };
            match rx.recv_timeout(remaining.min(READ_SLICE)) {
                Ok(found) => {
                    return found.map_err(|err| SmtpVerifyError::connect(host, err.to_string()));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SmtpVerifyError::connect(host, "address lookup aborted"));
                }
            }
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(
        &self,
        host: &str,
        port: u16,
        deadline: &Deadline,
    ) -> Result<TcpStream, SmtpVerifyError> {
        let addresses = match host.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => self.lookup_within(host, deadline)?,
        };

        let mut last_err = None;
        for ip in addresses {
            let Some(remaining) = deadline.remaining() else {
                return Err(SmtpVerifyError::Timeout);
            };
            let addr = SocketAddr::new(ip, port);
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err.to_string());
                }
            }
        }
        Err(SmtpVerifyError::connect(
            host,
            last_err.unwrap_or_else(|| "no address to connect to".to_string()),
        ))
    }
}
