//! Input data for one send.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local};
use ordermail_mime::{Attachment, Boundary, Headers, MessageBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::protocol::{Credentials, Envelope};
use crate::types::{Address, Mailbox};

/// A named email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Email address.
    pub address: String,
    /// Display name, may be empty.
    #[serde(default)]
    pub name: String,
}

impl Contact {
    /// Creates a contact.
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    fn mailbox(&self) -> Result<Mailbox> {
        if self.name.trim().is_empty() {
            Mailbox::new(self.address.trim())
        } else {
            Mailbox::with_name(self.name.trim(), self.address.trim())
        }
    }
}

/// File to attach, usually the generated order confirmation PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSource {
    /// Path of the file on disk.
    pub path: PathBuf,
    /// Name shown to the recipient. Defaults to the file name of `path`.
    #[serde(default)]
    pub filename: Option<String>,
    /// `Content-Description` text.
    #[serde(default)]
    pub description: Option<String>,
}

impl AttachmentSource {
    /// Creates a source for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filename: None,
            description: None,
        }
    }

    /// Sets the `Content-Description` text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name shown to the recipient.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.filename.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map_or_else(|| "attachment.pdf".to_string(), |name| {
                    name.to_string_lossy().into_owned()
                })
        })
    }

    /// Reads the file.
    ///
    /// Returns `Ok(None)` for an empty file, which is left out of the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentRead`] if the file cannot be read.
    pub async fn load(&self) -> Result<Option<Attachment>> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| Error::AttachmentRead {
                path: self.path.clone(),
                source,
            })?;

        if data.is_empty() {
            warn!(path = %self.path.display(), "attachment is empty, sending without it");
            return Ok(None);
        }

        let mut attachment = Attachment::pdf(self.display_name(), data);
        if let Some(description) = &self.description {
            attachment = attachment.with_description(Headers::encode_value(description));
        }
        Ok(Some(attachment))
    }
}

/// SMTP server and account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port, usually 587.
    pub port: u16,
    /// AUTH LOGIN user name.
    pub username: String,
    /// AUTH LOGIN password.
    pub password: String,
    /// Advisory encryption hint (e.g. `"STARTTLS"`). STARTTLS is used
    /// whenever the server advertises it.
    #[serde(default)]
    pub encryption: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("encryption", &self.encryption)
            .finish()
    }
}

/// Everything needed to send one order confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailData {
    /// Recipient.
    pub recipient: Contact,
    /// Sender shown in `From`. An empty address falls back to the server
    /// user name.
    #[serde(default)]
    pub sender: Contact,
    /// `Reply-To` contact. Defaults to the sender.
    #[serde(default)]
    pub reply_to: Option<Contact>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional attachment.
    #[serde(default)]
    pub attachment: Option<AttachmentSource>,
    /// Server and account.
    pub server: ServerConfig,
}

/// Time-dependent values of a message: `Date`, boundary and `Message-ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStamp {
    date: DateTime<FixedOffset>,
}

impl MessageStamp {
    /// Stamps with the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::at(Local::now().fixed_offset())
    }

    /// Stamps with a fixed time.
    #[must_use]
    pub const fn at(date: DateTime<FixedOffset>) -> Self {
        Self { date }
    }

    /// Unix time in milliseconds.
    #[must_use]
    pub fn millis(&self) -> i64 {
        self.date.timestamp_millis()
    }
}

impl EmailData {
    /// Checks every precondition that can be checked without I/O.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] listing every missing field, or
    /// [`Error::InvalidAddress`] for a malformed address.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.recipient.address.trim().is_empty() {
            missing.push("recipient address");
        }
        if self.server.host.trim().is_empty() {
            missing.push("server host");
        }
        if self.server.port == 0 {
            missing.push("server port");
        }
        if self.server.username.is_empty() {
            missing.push("username");
        }
        if self.server.password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(Error::Configuration(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        self.envelope()?;
        self.reply_to_mailbox()?;
        Ok(())
    }

    /// Returns the `From` mailbox, falling back to the user name.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn sender_mailbox(&self) -> Result<Mailbox> {
        if self.sender.address.trim().is_empty() {
            let name = self.sender.name.trim();
            if name.is_empty() {
                Mailbox::new(self.server.username.trim())
            } else {
                Mailbox::with_name(name, self.server.username.trim())
            }
        } else {
            self.sender.mailbox()
        }
    }

    /// Returns the `Reply-To` mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn reply_to_mailbox(&self) -> Result<Mailbox> {
        match &self.reply_to {
            Some(contact) if !contact.address.trim().is_empty() => contact.mailbox(),
            _ => self.sender_mailbox(),
        }
    }

    /// Returns the envelope addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid.
    pub fn envelope(&self) -> Result<Envelope> {
        Ok(Envelope {
            from: self.sender_mailbox()?.address,
            to: Address::new(self.recipient.address.trim())?,
        })
    }

    /// Returns the AUTH LOGIN credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.server.username, &self.server.password)
    }

    /// Renders the complete message.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid or a header value contains
    /// a line break.
    pub fn compose(
        &self,
        attachment: Option<Attachment>,
        stamp: &MessageStamp,
        mailer: &str,
    ) -> Result<Vec<u8>> {
        let from = self.sender_mailbox()?;
        let to = self.recipient.mailbox()?;
        let reply_to = self.reply_to_mailbox()?;
        let millis = stamp.millis();

        let mut builder = MessageBuilder::new()
            .boundary(Boundary::from_millis(millis))
            .header("From", from.to_string())
            .header("To", to.to_string())
            .header("Reply-To", reply_to.to_string())
            .header("Return-Path", format!("<{}>", from.address))
            .subject(&self.subject)
            .header("MIME-Version", "1.0")
            .date(&stamp.date)
            .header(
                "Message-ID",
                format!("<{millis}@{}>", from.address.domain()),
            )
            .header("X-Mailer", mailer)
            .header("X-Priority", "3 (Normal)")
            .header("X-MSMail-Priority", "Normal")
            .header("Importance", "Normal")
            .header("Auto-Submitted", "auto-generated")
            .header("X-Auto-Response-Suppress", "All")
            .header("Precedence", "bulk")
            .text_body(self.body.as_str());

        if let Some(attachment) = attachment {
            builder = builder.attach(attachment);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn data() -> EmailData {
        EmailData {
            recipient: Contact::new("jan@example.com", "Jan Kowalski"),
            sender: Contact::new("orders@shop.example.com", "Shop"),
            reply_to: None,
            subject: "Order 123".into(),
            body: "Thank you for your order.".into(),
            attachment: None,
            server: ServerConfig {
                host: "smtp.example.com".into(),
                port: 587,
                username: "orders@shop.example.com".into(),
                password: "secret".into(),
                encryption: "STARTTLS".into(),
            },
        }
    }

    fn stamp() -> MessageStamp {
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 12, 30, 0)
            .unwrap();
        MessageStamp::at(date)
    }

    fn header_names(message: &str) -> Vec<&str> {
        let head = message.split("\r\n\r\n").next().unwrap();
        head.split("\r\n")
            .map(|line| line.split(':').next().unwrap())
            .collect()
    }

    #[test]
    fn test_validate_ok() {
        data().validate().unwrap();
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let mut data = data();
        data.recipient.address.clear();
        data.server.host.clear();
        data.server.port = 0;
        data.server.password.clear();

        let err = data.validate().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(message.contains("recipient address"));
        assert!(message.contains("server host"));
        assert!(message.contains("server port"));
        assert!(message.contains("password"));
        assert!(!message.contains("username"));
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let mut data = data();
        data.recipient.address = "not-an-address".into();
        assert!(matches!(data.validate(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_sender_falls_back_to_username() {
        let mut data = data();
        data.sender = Contact::default();
        let envelope = data.envelope().unwrap();
        assert_eq!(envelope.from.as_str(), "orders@shop.example.com");
        assert_eq!(envelope.to.as_str(), "jan@example.com");
    }

    #[test]
    fn test_reply_to_defaults_to_sender() {
        let data = data();
        assert_eq!(data.reply_to_mailbox().unwrap().to_string(), "Shop <orders@shop.example.com>");
    }

    #[test]
    fn test_compose_header_order() {
        let mut data = data();
        data.reply_to = Some(Contact::new("help@shop.example.com", ""));
        let message = data.compose(None, &stamp(), "ordermail/test").unwrap();
        let message = String::from_utf8(message).unwrap();

        assert_eq!(
            header_names(&message),
            vec![
                "From",
                "To",
                "Reply-To",
                "Return-Path",
                "Subject",
                "MIME-Version",
                "Date",
                "Message-ID",
                "X-Mailer",
                "X-Priority",
                "X-MSMail-Priority",
                "Importance",
                "Auto-Submitted",
                "X-Auto-Response-Suppress",
                "Precedence",
                "Content-Type",
            ]
        );
        assert!(message.contains("From: Shop <orders@shop.example.com>\r\n"));
        assert!(message.contains("To: Jan Kowalski <jan@example.com>\r\n"));
        assert!(message.contains("Reply-To: <help@shop.example.com>\r\n"));
        assert!(message.contains("Return-Path: <orders@shop.example.com>\r\n"));
        assert!(message.contains("Date: Fri, 15 Mar 2024 12:30:00 +0000\r\n"));
        assert!(message.contains("Message-ID: <1710505800000@shop.example.com>\r\n"));
        assert!(message.contains(
            "Content-Type: multipart/mixed; boundary=\"----=_NextPart_1710505800000\"\r\n"
        ));
        assert!(message.ends_with("\r\n------=_NextPart_1710505800000--\r\n"));
    }

    #[test]
    fn test_compose_encodes_non_ascii_subject() {
        let mut data = data();
        data.subject = "Ó".into();
        let message = String::from_utf8(data.compose(None, &stamp(), "m").unwrap()).unwrap();
        assert!(message.contains("Subject: =?UTF-8?B?w5M=?=\r\n"));

        data.subject = "Test".into();
        let message = String::from_utf8(data.compose(None, &stamp(), "m").unwrap()).unwrap();
        assert!(message.contains("Subject: Test\r\n"));
    }

    #[test]
    fn test_compose_rejects_header_injection() {
        let mut data = data();
        data.subject = "Order\r\nBcc: victim@example.com".into();
        assert!(matches!(
            data.compose(None, &stamp(), "m"),
            Err(Error::Message(_))
        ));
    }

    #[test]
    fn test_compose_with_attachment() {
        let attachment = Attachment::pdf("order-123.pdf", b"%PDF-1.4".to_vec())
            .with_description("Order confirmation");
        let message = data().compose(Some(attachment), &stamp(), "m").unwrap();
        let message = String::from_utf8(message).unwrap();
        assert!(message.contains("Content-Type: application/pdf; name=\"order-123.pdf\"\r\n"));
        assert!(message.contains("Content-Disposition: attachment; filename=\"order-123.pdf\"\r\n"));
        assert!(message.contains("Content-Description: Order confirmation\r\n"));
        assert!(message.contains("JVBERi0xLjQ=\r\n"));
    }

    #[test]
    fn test_server_config_debug_redacts_password() {
        let debug = format!("{:?}", data().server);
        assert!(debug.contains("smtp.example.com"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_deserialize_minimal_job() {
        let json = r#"{
            "recipient": {"address": "jan@example.com"},
            "subject": "Order 1",
            "body": "Hi",
            "attachment": {"path": "/tmp/order-1.pdf"},
            "server": {"host": "smtp.example.com", "port": 587, "username": "u@example.com", "password": "p"}
        }"#;
        let data: EmailData = serde_json::from_str(json).unwrap();
        assert_eq!(data.recipient.name, "");
        assert!(data.reply_to.is_none());
        assert_eq!(data.attachment.unwrap().display_name(), "order-1.pdf");
        assert_eq!(data.server.encryption, "");
    }

    #[tokio::test]
    async fn test_load_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let source = AttachmentSource::new(&path).with_description("Potwierdzenie zamówienia");
        let attachment = source.load().await.unwrap().unwrap();
        assert_eq!(attachment.filename, "order.pdf");
        assert_eq!(attachment.data, b"%PDF");
        assert!(attachment.description.unwrap().starts_with("=?UTF-8?B?"));
    }

    #[tokio::test]
    async fn test_load_empty_attachment_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert!(AttachmentSource::new(&path).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_attachment() {
        let err = AttachmentSource::new("/nonexistent/order.pdf").load().await.unwrap_err();
        assert!(matches!(err, Error::AttachmentRead { .. }));
    }
}
