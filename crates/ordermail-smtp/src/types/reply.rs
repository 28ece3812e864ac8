//! SMTP reply types.

use crate::error::{Error, Result};

/// One line of an SMTP reply, e.g. `250-STARTTLS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// Reply code of this line.
    pub code: ReplyCode,
    /// True if the 4th character is `-` (more lines follow).
    pub continuation: bool,
    /// The line as received, without the trailing CRLF.
    pub raw: String,
}

impl ReplyLine {
    /// Parses a single reply line (without CRLF).
    ///
    /// A line must start with three ASCII digits. A bare code (`250`) is a
    /// valid final line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReply`] if the line does not start with a
    /// three-digit code.
    pub fn parse(line: &str) -> Result<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(Error::MalformedReply(line.to_string()));
        }

        let code = line[..3]
            .parse::<u16>()
            .map_err(|_| Error::MalformedReply(line.to_string()))?;

        Ok(Self {
            code: ReplyCode::new(code),
            continuation: bytes.get(3) == Some(&b'-'),
            raw: line.to_string(),
        })
    }

    /// Returns the text after the code and separator.
    #[must_use]
    pub fn text(&self) -> &str {
        self.raw.get(4..).unwrap_or("")
    }
}

/// Complete SMTP reply from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code, taken from the last line.
    pub code: ReplyCode,
    /// All lines of the reply in arrival order.
    pub lines: Vec<ReplyLine>,
}

impl Reply {
    /// Creates a reply from its lines. The code is taken from the last line.
    ///
    /// # Errors
    ///
    /// Returns an error if `lines` is empty.
    pub fn from_lines(lines: Vec<ReplyLine>) -> Result<Self> {
        let code = lines
            .last()
            .map(|line| line.code)
            .ok_or_else(|| Error::MalformedReply("empty reply".to_string()))?;
        Ok(Self { code, lines })
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the message text of every line joined by newlines.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.lines
            .iter()
            .map(ReplyLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the reply exactly as received, lines joined by CRLF.
    #[must_use]
    pub fn raw_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.raw.as_str())
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    /// Case-insensitive substring search over the raw reply text.
    #[must_use]
    pub fn mentions(&self, keyword: &str) -> bool {
        let keyword = keyword.to_ascii_uppercase();
        self.lines
            .iter()
            .any(|line| line.raw.to_ascii_uppercase().contains(&keyword))
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Reply codes used by the conversation
impl ReplyCode {
    /// 220 Service ready / ready to start TLS
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication successful
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable (not found, access denied)
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    mod reply_code_tests {
        use super::*;

        #[test]
        fn classes() {
            assert!(ReplyCode::OK.is_success());
            assert!(ReplyCode::CLOSING.is_success());
            assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
            assert!(ReplyCode::START_DATA.is_intermediate());
            assert!(ReplyCode::SERVICE_UNAVAILABLE.is_transient());
            assert!(ReplyCode::AUTH_FAILED.is_permanent());
            assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ReplyCode::OK), "250");
            assert_eq!(ReplyCode::new(354).as_u16(), 354);
        }
    }

    mod reply_line_tests {
        use super::*;

        #[test]
        fn final_line() {
            let line = ReplyLine::parse("250 OK").unwrap();
            assert_eq!(line.code, ReplyCode::OK);
            assert!(!line.continuation);
            assert_eq!(line.text(), "OK");
        }

        #[test]
        fn continuation_line() {
            let line = ReplyLine::parse("250-STARTTLS").unwrap();
            assert!(line.continuation);
            assert_eq!(line.text(), "STARTTLS");
        }

        #[test]
        fn bare_code() {
            let line = ReplyLine::parse("250").unwrap();
            assert!(!line.continuation);
            assert_eq!(line.text(), "");
        }

        #[test]
        fn malformed() {
            assert!(ReplyLine::parse("25").is_err());
            assert!(ReplyLine::parse("ABC OK").is_err());
            assert!(ReplyLine::parse("+25 OK").is_err());
        }
    }

    mod reply_tests {
        use super::*;

        fn reply(lines: &[&str]) -> Reply {
            Reply::from_lines(lines.iter().map(|l| ReplyLine::parse(l).unwrap()).collect())
                .unwrap()
        }

        #[test]
        fn code_from_last_line() {
            let reply = reply(&["250-smtp.example.com", "251 odd but final"]);
            assert_eq!(reply.code.as_u16(), 251);
        }

        #[test]
        fn message_and_raw_text() {
            let reply = reply(&["250-smtp.example.com", "250 AUTH LOGIN PLAIN"]);
            assert_eq!(reply.message_text(), "smtp.example.com\nAUTH LOGIN PLAIN");
            assert_eq!(
                reply.raw_text(),
                "250-smtp.example.com\r\n250 AUTH LOGIN PLAIN"
            );
        }

        #[test]
        fn mentions_is_case_insensitive() {
            let reply = reply(&["250-smtp.example.com", "250-starttls", "250 8BITMIME"]);
            assert!(reply.mentions("STARTTLS"));
            assert!(!reply.mentions("AUTH"));
        }

        #[test]
        fn empty_reply_rejected() {
            assert!(Reply::from_lines(Vec::new()).is_err());
        }
    }
}
