use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Fixed identity used by [`SmtpProbe`](super::SmtpProbe). Every session
/// presents the same `EHLO` name and envelope sender so servers see a stable
/// client. `timeout` bounds one whole session against one target.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub port: u16,
    pub helo_identity: String,
    pub mail_from: String,
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            helo_identity: "mailprobe.localhost".to_string(),
            mail_from: "verify@mailprobe.localhost".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}
