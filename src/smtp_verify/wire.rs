use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::deadline::Deadline;
use crate::smtp_verify::error::{SmtpVerifyError, is_timeout};

/// Upper bound of a single blocking read, so cancellation is observed even
/// while a server stays silent.
pub(crate) const READ_SLICE: Duration = Duration::from_millis(250);
const MAX_LINE: usize = 4096;
const MAX_REPLY_LINES: usize = 128;

/// A byte stream whose next blocking operation can be bounded.
pub(crate) trait Wire: Read + Write {
    fn arm(&mut self, timeout: Duration) -> io::Result<()>;
}

impl Wire for TcpStream {
    fn arm(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))?;
        self.set_write_timeout(Some(timeout))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Line-oriented SMTP codec over a [`Wire`]. Every operation is bounded by
/// the caller's [`Deadline`].
pub(crate) struct SmtpWire<W> {
    stream: W,
    buffer: Vec<u8>,
}

impl<W: Wire> SmtpWire<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
        }
    }

    pub fn send_command(&mut self, command: &str, deadline: &Deadline) -> Result<(), SmtpVerifyError> {
        let remaining = deadline.remaining().ok_or(SmtpVerifyError::Timeout)?;
        self.stream
            .arm(remaining)
            .map_err(SmtpVerifyError::from_io)?;
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.stream
            .write_all(&data)
            .map_err(SmtpVerifyError::from_io)?;
        self.stream.flush().map_err(SmtpVerifyError::from_io)
    }

    pub fn read_reply(&mut self, deadline: &Deadline) -> Result<SmtpReply, SmtpVerifyError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line(deadline)?;
            let parsed_code = reply_code(&line)
                .ok_or_else(|| SmtpVerifyError::Protocol(format!("invalid reply: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(SmtpVerifyError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                break;
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(SmtpVerifyError::Protocol("reply too long".into()));
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or(0),
            lines,
        })
    }

    fn read_line(&mut self, deadline: &Deadline) -> Result<String, SmtpVerifyError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else {
                    line.truncate(line.len() - 1);
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() > MAX_LINE {
                return Err(SmtpVerifyError::Protocol("line too long".into()));
            }

            let remaining = deadline.remaining().ok_or(SmtpVerifyError::Timeout)?;
            self.stream
                .arm(remaining.min(READ_SLICE))
                .map_err(SmtpVerifyError::from_io)?;

            let mut buf = [0u8; 512];
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    return Err(SmtpVerifyError::Io {
                        source: io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"),
                    });
                }
                Ok(read) => self.buffer.extend_from_slice(&buf[..read]),
                // slice elapsed, re-check the deadline
                Err(err) if is_timeout(&err) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(SmtpVerifyError::Io { source: err }),
            }
        }
    }
}

/// The three leading ASCII digits of a reply line.
fn reply_code(line: &str) -> Option<u16> {
    match line.as_bytes() {
        [a, b, c, ..] if [a, b, c].iter().all(|d| d.is_ascii_digit()) => {
            Some(u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0'))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::reply_code;

    #[test]
    fn reply_code_needs_three_digits() {
        assert_eq!(reply_code("250 ok"), Some(250));
        assert_eq!(reply_code("550-first line"), Some(550));
        assert_eq!(reply_code("+50 sneaky"), None);
        assert_eq!(reply_code("-25 nope"), None);
        assert_eq!(reply_code("25"), None);
        assert_eq!(reply_code("2a0 nope"), None);
    }
}
