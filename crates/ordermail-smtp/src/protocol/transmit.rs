//! Outgoing protocol data.
//
// Allow missing_const_for_fn since Vec methods aren't const in stable Rust.
#![allow(clippy::missing_const_for_fn)]

use crate::command::Command;

/// Data to transmit to the server.
///
/// The protocol layer produces these, the I/O layer writes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    /// Raw bytes to send to the server.
    pub data: Vec<u8>,
    /// Short description safe to log (credentials are never included).
    pub label: String,
}

impl Transmit {
    /// Creates a transmit for a command.
    #[must_use]
    pub fn command(command: &Command) -> Self {
        Self {
            data: command.serialize(),
            label: command.redacted(),
        }
    }

    /// Creates the DATA payload: the message followed by the terminating
    /// `.` line.
    ///
    /// With `dot_stuffing`, every line starting with `.` gets a second dot
    /// (RFC 5321 section 4.5.2).
    #[must_use]
    pub fn message_body(message: &[u8], dot_stuffing: bool) -> Self {
        let mut data = Vec::with_capacity(message.len() + 8);

        if dot_stuffing {
            data.extend_from_slice(&dot_stuff(message));
        } else {
            data.extend_from_slice(message);
        }
        if !data.is_empty() && !data.ends_with(b"\r\n") {
            data.extend_from_slice(b"\r\n");
        }
        data.extend_from_slice(b".\r\n");

        let label = format!("<message body, {} bytes>", message.len());
        Self { data, label }
    }

    /// Returns the data as a string slice, if valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Returns the length of the data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the transmit is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Transmit {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Doubles the leading dot of every line that starts with one.
#[must_use]
pub fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len());
    let mut at_line_start = true;

    for &byte in message {
        if at_line_start && byte == b'.' {
            out.push(b'.');
        }
        out.push(byte);
        at_line_start = byte == b'\n';
    }

    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_command() {
        let t = Transmit::command(&Command::Data);
        assert_eq!(t.as_str(), Some("DATA\r\n"));
        assert_eq!(t.label, "DATA");
        assert_eq!(t.len(), 6);
        assert!(!t.is_empty());
    }

    #[test]
    fn test_transmit_command_redacts_credentials() {
        let t = Transmit::command(&Command::auth_response("hunter2"));
        assert_eq!(t.as_str(), Some("aHVudGVyMg==\r\n"));
        assert!(!t.label.contains("aHVudGVyMg"));
    }

    #[test]
    fn test_message_body_appends_terminator() {
        let t = Transmit::message_body(b"Subject: x\r\n\r\nhi\r\n", false);
        assert_eq!(t.as_str(), Some("Subject: x\r\n\r\nhi\r\n.\r\n"));
    }

    #[test]
    fn test_message_body_adds_missing_crlf() {
        let t = Transmit::message_body(b"hi", false);
        assert_eq!(t.as_str(), Some("hi\r\n.\r\n"));
    }

    #[test]
    fn test_message_body_without_stuffing_keeps_dots() {
        let t = Transmit::message_body(b"a\r\n.b\r\n", false);
        assert_eq!(t.as_str(), Some("a\r\n.b\r\n.\r\n"));
    }

    #[test]
    fn test_message_body_with_stuffing() {
        let t = Transmit::message_body(b".a\r\nb\r\n.\r\n", true);
        assert_eq!(t.as_str(), Some("..a\r\nb\r\n..\r\n.\r\n"));
    }

    #[test]
    fn test_dot_stuff_only_line_starts() {
        assert_eq!(dot_stuff(b"a.b\r\n.c"), b"a.b\r\n..c");
        assert_eq!(dot_stuff(b""), b"");
    }

    #[test]
    fn test_transmit_as_ref() {
        let t = Transmit::command(&Command::Quit);
        let slice: &[u8] = t.as_ref();
        assert_eq!(slice, b"QUIT\r\n");
    }
}
