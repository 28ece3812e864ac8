//! # ordermail-smtp
//!
//! SMTP client for sending order confirmation emails (RFC 5321 subset).
//!
//! ## Features
//!
//! - **Sans-I/O conversation**: the protocol state machine never touches a
//!   socket, so every exchange can be tested without a network
//! - **Opportunistic STARTTLS**: the connection is upgraded in place when the
//!   server advertises it
//! - **AUTH LOGIN**: base64 challenge-response authentication
//! - **Single result**: every send ends with exactly one [`Outcome`], within a
//!   fixed time budget
//!
//! ## Quick Start
//!
//! ```ignore
//! use ordermail_smtp::{Contact, EmailData, MailSender, SenderOptions, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let email = EmailData {
//!         recipient: Contact::new("jan@example.com", "Jan Kowalski"),
//!         subject: "Order 123".into(),
//!         body: "Your order confirmation is attached.".into(),
//!         server: ServerConfig {
//!             host: "smtp.example.com".into(),
//!             port: 587,
//!             username: "orders@shop.example.com".into(),
//!             password: "secret".into(),
//!             ..ServerConfig::default()
//!         },
//!         ..EmailData::default()
//!     };
//!
//!     let outcome = MailSender::new(SenderOptions::default()).send(&email).await;
//!     println!("{}: {}", outcome.success, outcome.message);
//! }
//! ```
//!
//! ## Conversation
//!
//! ```text
//! 220 → EHLO → 250 ┬ STARTTLS → 220 → TLS → EHLO → 250 ┐
//!                  ├ AUTH ─────────────────────────────┴→ AUTH LOGIN → 334 → user → 334 → pass → 235 ┐
//!                  └ neither ────────────────────────────────────────────────────────────────────────┴→ MAIL FROM
//! MAIL FROM → 250 → RCPT TO → 250 → DATA → 354 → message + "." → 250 → QUIT → 221
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: TCP / TLS transports
//! - [`parser`]: Incremental reply parser
//! - [`protocol`]: Sans-I/O conversation state machine
//! - [`types`]: Core SMTP types (addresses, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod config;
pub mod connection;
mod email;
mod error;
pub mod parser;
pub mod protocol;
mod sender;
mod timeout;
pub mod types;

pub use config::{DEFAULT_MAILER, SenderOptions};
pub use connection::{Plaintext, SmtpStream, TlsSettings, Transport};
pub use email::{AttachmentSource, Contact, EmailData, MessageStamp, ServerConfig};
pub use error::{Error, ErrorKind, Result};
pub use parser::ReplyParser;
pub use protocol::{Conversation, ConversationState, Credentials, Envelope, Step, Transmit};
pub use sender::{MailSender, Outcome, SUCCESS_MESSAGE};
pub use timeout::{DEFAULT_TIMEOUT, TimeoutGuard};
pub use types::{Address, Mailbox, Reply, ReplyCode, ReplyLine};
