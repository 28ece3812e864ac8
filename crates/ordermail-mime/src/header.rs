//! MIME header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of email headers.
///
/// Headers are written in insertion order, which matters for the generated
/// message: `From`/`To` first, `Content-Type` last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value, keeping any existing values.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Checks that every header can be written without corrupting the message.
    ///
    /// Names must be printable ASCII without `:` or spaces; values must not
    /// contain CR or LF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for the first offending header.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.headers {
            if name.is_empty()
                || !name
                    .bytes()
                    .all(|b| b.is_ascii_graphic() && b != b':')
            {
                return Err(Error::InvalidHeader(format!("bad header name {name:?}")));
            }
            if value.contains(['\r', '\n']) {
                return Err(Error::InvalidHeader(format!(
                    "{name} value contains a line break"
                )));
            }
        }
        Ok(())
    }

    /// Encodes a header value using RFC 2047 if it contains non-ASCII text.
    #[must_use]
    pub fn encode_value(value: &str) -> String {
        encode_rfc2047(value, "UTF-8")
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
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
    fn test_empty_headers_render_nothing() {
        assert_eq!(Headers::new().to_string(), "");
        assert!(Headers::new().validate().is_ok());
    }

    #[test]
    fn test_display_keeps_insertion_order() {
        let mut headers = Headers::new();
        headers.add("From", "Shop <orders@shop.test>");
        headers.add("To", "Jan Kowalski <jan@example.test>");
        headers.add("Subject", "Order 123");
        headers.add("To", "<second@example.test>");

        assert_eq!(
            headers.to_string(),
            "From: Shop <orders@shop.test>\r\n\
             To: Jan Kowalski <jan@example.test>\r\n\
             Subject: Order 123\r\n\
             To: <second@example.test>\r\n"
        );
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        for value in ["Order\r\nBcc: victim@example.com", "Order\nBcc: x", "Order\r"] {
            let mut headers = Headers::new();
            headers.add("Subject", value);
            assert!(matches!(headers.validate(), Err(Error::InvalidHeader(_))), "{value:?}");
        }
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        for name in ["", "X Bad", "Subject:", "Temat\u{f3}"] {
            let mut headers = Headers::new();
            headers.add(name, "value");
            assert!(headers.validate().is_err(), "{name:?}");
        }
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(Headers::encode_value("Order 123"), "Order 123");
        assert_eq!(Headers::encode_value("Ó"), "=?UTF-8?B?w5M=?=");
    }
}
