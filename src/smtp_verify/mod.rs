//! SMTP mailbox probing.
//!
//! [`SmtpProbe`] runs a minimal dialogue (greeting, `EHLO`, `MAIL FROM`,
//! `RCPT TO`, `QUIT`) against one mail target and classifies the answer to
//! `RCPT TO` with [`analyze_response`]. No message is ever transmitted.

mod classify;
mod error;
mod options;
mod probe;
mod session;
mod types;
mod wire;

pub use classify::{analyze_response, reasons};
pub use options::ProbeOptions;
pub use probe::{MailboxProbe, SmtpProbe};
pub use types::{ProbeOutcome, ProbeStatus};
