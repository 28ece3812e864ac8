//! Incremental SMTP reply parser.
//!
//! Replies can be single-line or multi-line:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
//!
//! Data may arrive in arbitrary chunks. Only CRLF-terminated lines are
//! considered; a trailing partial line stays buffered until the rest of it
//! arrives.

use crate::error::Result;
use crate::types::{Reply, ReplyLine};

/// Upper bound on buffered, not yet terminated input.
const MAX_BUFFERED: usize = 64 * 1024;

/// Accumulates received bytes and yields complete replies.
#[derive(Debug, Default)]
pub struct ReplyParser {
    /// Bytes not yet split into lines.
    buffer: Vec<u8>,
    /// Lines of the reply currently being assembled.
    lines: Vec<ReplyLine>,
}

impl ReplyParser {
    /// Creates an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns the next complete reply, if any.
    ///
    /// Bytes following a complete reply stay buffered; call `feed(&[])` to
    /// collect a reply that is already fully buffered.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedReply`] if a line does not start with
    /// a three-digit code, or if the server sends an unterminated line longer
    /// than the internal limit.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<Reply>> {
        self.buffer.extend_from_slice(data);

        while let Some(pos) = find_crlf(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let line = String::from_utf8_lossy(&raw[..pos]);
            let line = ReplyLine::parse(&line)?;
            let last = !line.continuation;
            self.lines.push(line);

            if last {
                let lines = std::mem::take(&mut self.lines);
                return Reply::from_lines(lines).map(Some);
            }
        }

        if self.buffer.len() > MAX_BUFFERED {
            return Err(crate::Error::MalformedReply(format!(
                "reply line exceeds {MAX_BUFFERED} bytes"
            )));
        }

        Ok(None)
    }

    /// Returns true if no partial data is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.lines.is_empty()
    }

    /// Drops everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.lines.clear();
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_single_line_reply() {
        let mut parser = ReplyParser::new();
        let reply = parser.feed(b"250 OK\r\n").unwrap().unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message_text(), "OK");
        assert!(parser.is_empty());
    }

    #[test]
    fn test_multi_line_reply() {
        let mut parser = ReplyParser::new();
        let reply = parser
            .feed(b"250-First line\r\n250-Second line\r\n250 Last line\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines.len(), 3);
        assert_eq!(reply.message_text(), "First line\nSecond line\nLast line");
    }

    #[test]
    fn test_multi_line_waits_for_final_line() {
        let mut parser = ReplyParser::new();
        assert!(parser.feed(b"250-smtp.example.com\r\n").unwrap().is_none());
        assert!(parser.feed(b"250-STARTTLS\r\n").unwrap().is_none());
        assert!(parser.feed(b"250 AUTH LOGIN").unwrap().is_none());
        let reply = parser.feed(b"\r\n").unwrap().unwrap();
        assert!(reply.mentions("STARTTLS"));
        assert_eq!(reply.lines.len(), 3);
    }

    #[test]
    fn test_byte_by_byte_yields_one_reply() {
        let data = b"250-smtp.example.com\r\n250-AUTH LOGIN\r\n250 8BITMIME\r\n";
        let mut parser = ReplyParser::new();
        let mut replies = Vec::new();
        for byte in data {
            if let Some(reply) = parser.feed(std::slice::from_ref(byte)).unwrap() {
                replies.push(reply);
            }
        }
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].lines.len(), 3);
    }

    #[test]
    fn test_cr_split_from_lf() {
        let mut parser = ReplyParser::new();
        assert!(parser.feed(b"220 ready\r").unwrap().is_none());
        assert!(parser.feed(b"\n").unwrap().is_some());
    }

    #[test]
    fn test_code_taken_from_last_line() {
        let mut parser = ReplyParser::new();
        let reply = parser.feed(b"250-ok so far\r\n554 rejected\r\n").unwrap().unwrap();
        assert_eq!(reply.code.as_u16(), 554);
    }

    #[test]
    fn test_bare_code_closes_reply() {
        let mut parser = ReplyParser::new();
        let reply = parser.feed(b"250-hello\r\n250\r\n").unwrap().unwrap();
        assert_eq!(reply.lines.len(), 2);
    }

    #[test]
    fn test_following_reply_stays_buffered() {
        let mut parser = ReplyParser::new();
        let first = parser.feed(b"250 first\r\n354 second\r\n").unwrap().unwrap();
        assert_eq!(first.code.as_u16(), 250);
        assert!(!parser.is_empty());
        let second = parser.feed(&[]).unwrap().unwrap();
        assert_eq!(second.code.as_u16(), 354);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_malformed_line() {
        let mut parser = ReplyParser::new();
        let err = parser.feed(b"hello there\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedReply(_)));
    }

    #[test]
    fn test_oversized_line() {
        let mut parser = ReplyParser::new();
        let junk = vec![b'2'; MAX_BUFFERED + 1];
        assert!(parser.feed(&junk).is_err());
    }

    #[test]
    fn test_clear() {
        let mut parser = ReplyParser::new();
        parser.feed(b"250-partial\r\n250 ha").unwrap();
        parser.clear();
        assert!(parser.is_empty());
    }

    #[test]
    fn test_greeting_text() {
        let mut parser = ReplyParser::new();
        let reply = parser.feed(b"220 smtp.example.com ESMTP ready\r\n").unwrap().unwrap();
        assert_eq!(reply.code.as_u16(), 220);
        assert_eq!(reply.message_text(), "smtp.example.com ESMTP ready");
    }
}
