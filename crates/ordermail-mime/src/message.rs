//! MIME message structure and generation.

use crate::content_type::{ContentType, quoted};
use crate::encoding::encode_base64_wrapped;
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// Multipart boundary marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Prefix shared by every generated boundary.
    pub const PREFIX: &'static str = "----=_NextPart_";

    /// Creates a boundary from an explicit value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates a boundary from a millisecond timestamp.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("{}{millis}", Self::PREFIX))
    }

    /// Creates a boundary from the current time.
    ///
    /// Only needs to be unlikely to collide with the content of one message.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    /// Returns the boundary value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Content type of the attachment.
    pub content_type: ContentType,
    /// Optional `Content-Description` text.
    pub description: Option<String>,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment with an explicit content type.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: ContentType, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            description: None,
            data,
        }
    }

    /// Creates a PDF attachment.
    #[must_use]
    pub fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = ContentType::application_pdf(filename.clone());
        Self::new(filename, content_type, data)
    }

    /// Sets the `Content-Description` text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Converts the attachment into a base64 body part.
    fn into_part(self) -> Part {
        let mut headers = Headers::new();
        headers.add("Content-Type", self.content_type.to_string());
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string());
        headers.add(
            "Content-Disposition",
            format!("attachment; filename={}", quoted(&self.filename)),
        );
        if let Some(description) = self.description {
            headers.add("Content-Description", description);
        }

        Part::new(headers, encode_base64_wrapped(&self.data).into_bytes())
    }
}

/// MIME message part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Encoded part body, CRLF-terminated.
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Creates a `text/plain` UTF-8 part sent as 8bit.
    ///
    /// Bare LF line endings are normalised to CRLF and the body always ends
    /// with CRLF.
    #[must_use]
    pub fn text(text: &str) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add("Content-Transfer-Encoding", TransferEncoding::EightBit.to_string());

        let mut body = normalize_line_endings(text);
        if !body.ends_with("\r\n") {
            body.push_str("\r\n");
        }

        Self::new(headers, body.into_bytes())
    }

    fn write_to(&self, boundary: &Boundary, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
    }
}

/// Converts bare `\n` (and lone `\r`) line endings to `\r\n`.
fn normalize_line_endings(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                result.push_str("\r\n");
            }
            '\n' => result.push_str("\r\n"),
            _ => result.push(ch),
        }
    }

    result
}

/// Builder for `multipart/mixed` messages.
///
/// Headers are emitted in the order they were added, followed by the
/// generated `Content-Type` header.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    headers: Headers,
    boundary: Option<Boundary>,
    text: Option<String>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the multipart boundary. Defaults to [`Boundary::generate`].
    #[must_use]
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Appends a header verbatim.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Appends the `Subject` header, RFC 2047 encoded if it is not plain ASCII.
    #[must_use]
    pub fn subject(self, subject: &str) -> Self {
        self.header("Subject", Headers::encode_value(subject))
    }

    /// Appends an RFC 2822 `Date` header.
    #[must_use]
    pub fn date<Tz: TimeZone>(self, date: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        self.header("Date", date.to_rfc2822())
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds an attachment. Attachments without data are left out of the message.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if no text body was set or if a header value would
    /// break the header block.
    pub fn build(self) -> Result<Vec<u8>> {
        let text = self.text.ok_or(Error::MissingBody)?;
        let boundary = self.boundary.unwrap_or_else(Boundary::generate);

        let mut headers = self.headers;
        headers.add(
            "Content-Type",
            ContentType::multipart_mixed(boundary.as_str()).to_string(),
        );
        headers.validate()?;

        let mut parts = vec![Part::text(&text)];
        for attachment in self.attachments {
            if attachment.data.is_empty() {
                continue;
            }
            let part = attachment.into_part();
            part.headers.validate()?;
            parts.push(part);
        }

        let mut out = Vec::new();
        out.extend_from_slice(headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        for part in &parts {
            part.write_to(&boundary, &mut out);
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(out)
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
    use crate::encoding::decode_base64_wrapped;

    fn builder() -> MessageBuilder {
        MessageBuilder::new()
            .boundary(Boundary::from_millis(1700000000000))
            .header("From", "Shop <shop@example.com>")
            .header("To", "Jan <jan@example.com>")
    }

    #[test]
    fn test_transfer_encoding_display() {
        assert_eq!(TransferEncoding::EightBit.to_string(), "8bit");
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_boundary_from_millis() {
        let boundary = Boundary::from_millis(42);
        assert_eq!(boundary.as_str(), "----=_NextPart_42");
        assert!(Boundary::generate().as_str().starts_with(Boundary::PREFIX));
    }

    #[test]
    fn test_text_only_message() {
        let message = builder().subject("Test").text_body("Hello").build().unwrap();
        let text = String::from_utf8(message).unwrap();

        assert_eq!(
            text,
            concat!(
                "From: Shop <shop@example.com>\r\n",
                "To: Jan <jan@example.com>\r\n",
                "Subject: Test\r\n",
                "Content-Type: multipart/mixed; boundary=\"----=_NextPart_1700000000000\"\r\n",
                "\r\n",
                "------=_NextPart_1700000000000\r\n",
                "Content-Type: text/plain; charset=UTF-8\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "Hello\r\n",
                "------=_NextPart_1700000000000--\r\n",
            )
        );
    }

    #[test]
    fn test_subject_encoded_when_non_ascii() {
        let message = builder().subject("Ó").text_body("x").build().unwrap();
        let text = String::from_utf8(message).unwrap();
        assert!(text.contains("Subject: =?UTF-8?B?w5M=?=\r\n"));
    }

    #[test]
    fn test_body_line_endings_normalized() {
        let message = builder().text_body("one\ntwo\r\nthree").build().unwrap();
        let text = String::from_utf8(message).unwrap();
        assert!(text.contains("\r\n\r\none\r\ntwo\r\nthree\r\n------=_NextPart_"));
    }

    #[test]
    fn test_pdf_attachment_part() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let message = builder()
            .text_body("See attached.")
            .attach(
                Attachment::pdf("order-123.pdf", data.clone())
                    .with_description("Order confirmation"),
            )
            .build()
            .unwrap();
        let text = String::from_utf8(message).unwrap();

        assert!(text.contains("Content-Type: application/pdf; name=\"order-123.pdf\"\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(text.contains("Content-Disposition: attachment; filename=\"order-123.pdf\"\r\n"));
        assert!(text.contains("Content-Description: Order confirmation\r\n"));
        assert!(text.ends_with("------=_NextPart_1700000000000--\r\n"));

        let marker = "Order confirmation\r\n\r\n";
        let start = text.find(marker).unwrap() + marker.len();
        let end = text.rfind("------=_NextPart_1700000000000--").unwrap();
        let encoded = &text[start..end];
        for line in encoded.split_terminator("\r\n") {
            assert!(line.len() <= 76);
        }
        assert_eq!(decode_base64_wrapped(encoded).unwrap(), data);
    }

    #[test]
    fn test_attachment_filename_quotes_escaped() {
        let message = builder()
            .text_body("See attached.")
            .attach(Attachment::pdf(r#"order "123".pdf"#, b"%PDF-1.4".to_vec()))
            .build()
            .unwrap();
        let text = String::from_utf8(message).unwrap();

        assert!(text.contains(
            "Content-Disposition: attachment; filename=\"order \\\"123\\\".pdf\"\r\n"
        ));
        assert!(text.contains("Content-Type: application/pdf; name=\"order \\\"123\\\".pdf\"\r\n"));
    }

    #[test]
    fn test_empty_attachment_skipped() {
        let message = builder()
            .text_body("No file")
            .attach(Attachment::pdf("empty.pdf", Vec::new()))
            .build()
            .unwrap();
        let text = String::from_utf8(message).unwrap();
        assert!(!text.contains("application/pdf"));
        assert_eq!(text.matches("------=_NextPart_1700000000000").count(), 2);
    }

    #[test]
    fn test_missing_body() {
        assert!(matches!(builder().build(), Err(Error::MissingBody)));
    }

    #[test]
    fn test_header_injection_rejected() {
        let result = builder()
            .subject("Order\r\nBcc: someone@example.com")
            .text_body("x")
            .build();
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_date_header() {
        let date = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
        let message = builder().date(&date).text_body("x").build().unwrap();
        let text = String::from_utf8(message).unwrap();
        assert!(text.contains("Date: Fri, 15 Mar 2024 12:30:00 +0000\r\n"));
    }
}
