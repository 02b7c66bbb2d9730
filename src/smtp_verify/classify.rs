use super::ProbeOutcome;

/// Reason strings carried by [`ProbeOutcome::reason`].
pub mod reasons {
    pub const COULD_NOT_CONNECT: &str = "could not connect";
    pub const GREETING_FAILED: &str = "server greeting failed";
    pub const IDENTIFICATION_REJECTED: &str = "identification rejected";
    pub const SENDER_REJECTED: &str = "sender declaration rejected";
    pub const TIMEOUT: &str = "timeout";
    pub const MAILBOX_CONFIRMED: &str = "mailbox confirmed";
    pub const MAILBOX_MISSING: &str = "mailbox does not exist";
    pub const MAILBOX_FULL: &str = "mailbox full or over quota";
    pub const SERVER_REJECTED: &str = "server rejected the request";
    pub const TEMPORARY: &str = "greylisted or temporary server issue";
    pub const UNKNOWN: &str = "unknown response";
}

/// Classifies the reply to `RCPT TO`.
///
/// Only 550/551/553 count as a negative answer; quota, policy and transient
/// codes are common for mailboxes that do exist.
pub fn analyze_response(code: u16) -> ProbeOutcome {
    match code {
        200..=299 => ProbeOutcome::confirmed(code, reasons::MAILBOX_CONFIRMED),
        550 | 551 | 553 => ProbeOutcome::rejected(code, reasons::MAILBOX_MISSING),
        552 => ProbeOutcome::inconclusive(code, reasons::MAILBOX_FULL),
        500..=599 => ProbeOutcome::inconclusive(code, reasons::SERVER_REJECTED),
        400..=499 => ProbeOutcome::inconclusive(code, reasons::TEMPORARY),
        _ => ProbeOutcome::inconclusive(code, reasons::UNKNOWN),
    }
}
