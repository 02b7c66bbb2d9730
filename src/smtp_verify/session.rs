//! One SMTP dialogue as an explicit state machine.
//!
//! Each transition consumes the current state and either continues with the
//! next one or breaks with the final [`ProbeOutcome`]. No message is ever
//! sent past `RCPT TO`: the session always ends with `QUIT`.

use std::ops::ControlFlow;
use std::time::Duration;

use tracing::debug;

use crate::deadline::Deadline;
use crate::mx::MailTarget;
use crate::smtp_verify::classify::{analyze_response, reasons};
use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::options::ProbeOptions;
use crate::smtp_verify::types::ProbeOutcome;
use crate::smtp_verify::wire::{SmtpReply, SmtpWire, Wire};

/// Time granted to the server to acknowledge `QUIT`.
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Opens the transport to a mail target.
pub(crate) trait Connector {
    type Stream: Wire;

    fn connect(
        &self,
        host: &str,
        port: u16,
        deadline: &Deadline,
    ) -> Result<Self::Stream, SmtpVerifyError>;
}

pub(crate) enum SessionState<S> {
    Disconnected,
    Connected(SmtpWire<S>),
    Greeted(SmtpWire<S>),
    HeloAccepted(SmtpWire<S>),
    SenderAccepted(SmtpWire<S>),
    RecipientEvaluated(SmtpWire<S>, ProbeOutcome),
    Closed(ProbeOutcome),
}

type Transition<S> = ControlFlow<ProbeOutcome, SessionState<S>>;

pub(crate) struct Session<'a, C> {
    connector: &'a C,
    target: &'a MailTarget,
    candidate: &'a str,
    options: &'a ProbeOptions,
    deadline: Deadline,
}

impl<'a, C: Connector> Session<'a, C> {
    pub fn new(
        connector: &'a C,
        target: &'a MailTarget,
        candidate: &'a str,
        options: &'a ProbeOptions,
        deadline: Deadline,
    ) -> Self {
        Self {
            connector,
            target,
            candidate,
            options,
            deadline,
        }
    }

    pub fn run(&self) -> ProbeOutcome {
        let mut state = SessionState::Disconnected;
        loop {
            let transition = match state {
                SessionState::Disconnected => self.connect(),
                SessionState::Connected(wire) => self.greet(wire),
                SessionState::Greeted(wire) => self.identify(wire),
                SessionState::HeloAccepted(wire) => self.declare_sender(wire),
                SessionState::SenderAccepted(wire) => self.declare_recipient(wire),
                SessionState::RecipientEvaluated(wire, outcome) => self.close(wire, outcome),
                SessionState::Closed(outcome) => return outcome,
            };
            state = match transition {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(outcome) => return outcome,
            };
        }
    }

    fn connect(&self) -> Transition<C::Stream> {
        let host = self.target.host.as_str();
        match self.connector.connect(host, self.options.port, &self.deadline) {
            Ok(stream) => {
                debug!(host, port = self.options.port, "connected");
                ControlFlow::Continue(SessionState::Connected(SmtpWire::new(stream)))
            }
            Err(SmtpVerifyError::Timeout) => ControlFlow::Break(timed_out()),
            Err(err) => {
                debug!(host, error = %err, "connection failed");
                ControlFlow::Break(ProbeOutcome::inconclusive(0, reasons::COULD_NOT_CONNECT))
            }
        }
    }

    fn greet(&self, mut wire: SmtpWire<C::Stream>) -> Transition<C::Stream> {
        match wire.read_reply(&self.deadline) {
            Ok(reply) => {
                self.trace_reply(&reply);
                if reply.is_positive_completion() {
                    ControlFlow::Continue(SessionState::Greeted(wire))
                } else {
                    ControlFlow::Break(ProbeOutcome::inconclusive(
                        reply.code,
                        reasons::GREETING_FAILED,
                    ))
                }
            }
            Err(SmtpVerifyError::Timeout) => ControlFlow::Break(timed_out()),
            Err(err) => {
                debug!(host = %self.target.host, error = %err, "greeting failed");
                ControlFlow::Break(ProbeOutcome::inconclusive(0, reasons::GREETING_FAILED))
            }
        }
    }

    fn identify(&self, mut wire: SmtpWire<C::Stream>) -> Transition<C::Stream> {
        let identity = &self.options.helo_identity;
        let mut reply = match self.command(&mut wire, &format!("EHLO {identity}")) {
            Ok(reply) => reply,
            Err(err) => return ControlFlow::Break(failed(err, reasons::IDENTIFICATION_REJECTED)),
        };
        // EHLO unknown: retry with plain HELO
        if matches!(reply.code, 500 | 502) {
            reply = match self.command(&mut wire, &format!("HELO {identity}")) {
                Ok(reply) => reply,
                Err(err) => {
                    return ControlFlow::Break(failed(err, reasons::IDENTIFICATION_REJECTED));
                }
            };
        }
        if reply.is_positive_completion() {
            ControlFlow::Continue(SessionState::HeloAccepted(wire))
        } else {
            self.abandon(
                wire,
                ProbeOutcome::inconclusive(reply.code, reasons::IDENTIFICATION_REJECTED),
            )
        }
    }

    fn declare_sender(&self, mut wire: SmtpWire<C::Stream>) -> Transition<C::Stream> {
        let command = format!("MAIL FROM:<{}>", self.options.mail_from);
        match self.command(&mut wire, &command) {
            Ok(reply) if reply.is_positive_completion() => {
                ControlFlow::Continue(SessionState::SenderAccepted(wire))
            }
            Ok(reply) => self.abandon(
                wire,
                ProbeOutcome::inconclusive(reply.code, reasons::SENDER_REJECTED),
            ),
            Err(err) => ControlFlow::Break(failed(err, reasons::SENDER_REJECTED)),
        }
    }

    fn declare_recipient(&self, mut wire: SmtpWire<C::Stream>) -> Transition<C::Stream> {
        let command = format!("RCPT TO:<{}>", self.candidate);
        let outcome = match self.command(&mut wire, &command) {
            Ok(reply) => analyze_response(reply.code),
            Err(SmtpVerifyError::Timeout) => return ControlFlow::Break(timed_out()),
            Err(err) => {
                debug!(host = %self.target.host, error = %err, "no usable RCPT reply");
                analyze_response(0)
            }
        };
        ControlFlow::Continue(SessionState::RecipientEvaluated(wire, outcome))
    }

    fn close(&self, wire: SmtpWire<C::Stream>, outcome: ProbeOutcome) -> Transition<C::Stream> {
        self.quit(wire);
        ControlFlow::Continue(SessionState::Closed(outcome))
    }

    fn abandon(&self, wire: SmtpWire<C::Stream>, outcome: ProbeOutcome) -> Transition<C::Stream> {
        self.quit(wire);
        ControlFlow::Break(outcome)
    }

    /// Best effort: failures while closing never change the outcome.
    fn quit(&self, mut wire: SmtpWire<C::Stream>) {
        let grace = self.deadline.narrow(QUIT_GRACE);
        debug!(host = %self.target.host, "C: QUIT");
        if wire.send_command("QUIT", &grace).is_ok() {
            if let Ok(reply) = wire.read_reply(&grace) {
                self.trace_reply(&reply);
            }
        }
    }

    fn command(
        &self,
        wire: &mut SmtpWire<C::Stream>,
        command: &str,
    ) -> Result<SmtpReply, SmtpVerifyError> {
        debug!(host = %self.target.host, "C: {command}");
        wire.send_command(command, &self.deadline)?;
        let reply = wire.read_reply(&self.deadline)?;
        self.trace_reply(&reply);
        Ok(reply)
    }

    fn trace_reply(&self, reply: &SmtpReply) {
        for line in &reply.lines {
            debug!(host = %self.target.host, "S: {} {line}", reply.code);
        }
    }
}

fn timed_out() -> ProbeOutcome {
    ProbeOutcome::inconclusive(0, reasons::TIMEOUT)
}

fn failed(err: SmtpVerifyError, reason: &str) -> ProbeOutcome {
    match err {
        SmtpVerifyError::Timeout => timed_out(),
        _ => ProbeOutcome::inconclusive(0, reason),
    }
}
