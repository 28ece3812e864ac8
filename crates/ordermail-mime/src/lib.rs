//! # ordermail-mime
//!
//! MIME message generation for order confirmation emails.
//!
//! ## Features
//!
//! - **Message generation**: `multipart/mixed` messages with a plain-text part
//!   and an optional base64 attachment
//! - **Encoding**: Base64 (RFC 2045 line wrapping) and RFC 2047 header encoding
//! - **Deterministic output**: boundary, date and message id can be pinned,
//!   so the same inputs always produce the same bytes
//!
//! ## Quick Start
//!
//! ```ignore
//! use ordermail_mime::{Attachment, Boundary, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .boundary(Boundary::new("----=_NextPart_1700000000000"))
//!     .header("From", "Shop <shop@example.com>")
//!     .header("To", "Jan Kowalski <jan@example.com>")
//!     .subject("Order 123")
//!     .header("MIME-Version", "1.0")
//!     .text_body("See attached.")
//!     .attach(Attachment::pdf("order-123.pdf", pdf_bytes))
//!     .build()?;
//! ```
//!
//! ### Encoding
//!
//! ```ignore
//! use ordermail_mime::encoding::{encode_base64_wrapped, encode_rfc2047};
//!
//! let body = encode_base64_wrapped(&pdf_bytes);
//! let subject = encode_rfc2047("Zamówienie 123", "UTF-8");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Attachment, Boundary, MessageBuilder, Part, TransferEncoding};
