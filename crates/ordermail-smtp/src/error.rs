//! Error types for SMTP operations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::ConversationState;
use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
///
/// Every variant is terminal for the conversation it was raised in.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid server / recipient configuration.
    #[error("Invalid SMTP configuration: {0}")]
    Configuration(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message could not be generated.
    #[error("Cannot build message: {0}")]
    Message(#[from] ordermail_mime::Error),

    /// Attachment file is missing or unreadable.
    #[error("Cannot read attachment {}: {source}", .path.display())]
    AttachmentRead {
        /// Attachment path as given by the caller.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// TCP connect failure or socket error before the conversation ended.
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// Server closed the connection before the conversation ended.
    #[error("Connection closed by server in state {0}")]
    ConnectionClosed(ConversationState),

    /// STARTTLS negotiation or upgrade failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Server replied with a code the current state does not accept.
    #[error("SMTP error {code} in state {state}: {text}")]
    Protocol {
        /// Reply code (e.g., 550).
        code: u16,
        /// Conversation state the reply arrived in.
        state: ConversationState,
        /// Raw reply text from the server.
        text: String,
    },

    /// Server reply could not be parsed.
    #[error("Malformed server reply: {0}")]
    MalformedReply(String),

    /// The conversation did not finish within its time budget.
    #[error("SMTP conversation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Operation is not valid in the current state.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

/// Failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration or message problem detected before connecting.
    Configuration,
    /// Attachment could not be read.
    AttachmentRead,
    /// Network failure.
    Connection,
    /// TLS failure.
    Tls,
    /// Unexpected or malformed server reply.
    Protocol,
    /// Time budget exhausted.
    Timeout,
}

impl Error {
    /// Creates a protocol error from a rejected reply.
    #[must_use]
    pub fn protocol(code: u16, state: ConversationState, text: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            state,
            text: text.into(),
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::InvalidAddress(_) | Self::Message(_) => {
                ErrorKind::Configuration
            }
            Self::AttachmentRead { .. } => ErrorKind::AttachmentRead,
            Self::Connection(_) | Self::ConnectionClosed(_) => ErrorKind::Connection,
            Self::Tls(_) => ErrorKind::Tls,
            Self::Protocol { .. } | Self::MalformedReply(_) | Self::InvalidState(_) => {
                ErrorKind::Protocol
            }
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Returns the server reply code, if this error carries one.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.code().is_some_and(|code| ReplyCode::new(code).is_permanent())
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code().is_some_and(|code| ReplyCode::new(code).is_transient())
    }

    /// Returns true if sending again later may succeed: 4xx replies, network
    /// failures and timeouts.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_transient() || matches!(self.kind(), ErrorKind::Connection | ErrorKind::Timeout)
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Self::Tls(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_message_has_code_state_and_text() {
        let err = Error::protocol(535, ConversationState::AuthResult, "5.7.8 Authentication failed");
        assert_eq!(
            err.to_string(),
            "SMTP error 535 in state AuthResult: 5.7.8 Authentication failed"
        );
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.code(), Some(535));
        assert!(err.is_permanent());
        assert!(!err.is_transient());
    }

    #[test]
    fn transient_error() {
        let err = Error::protocol(451, ConversationState::RcptTo, "Try again later");
        assert!(err.is_transient());
        assert!(!err.is_permanent());
        assert!(err.is_retryable());
    }

    #[test]
    fn retryable_errors() {
        assert!(Error::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(Error::ConnectionClosed(ConversationState::Data).is_retryable());
        assert!(!Error::protocol(550, ConversationState::RcptTo, "no such user").is_retryable());
        assert!(!Error::Tls("handshake failed".into()).is_retryable());
        assert!(!Error::Configuration("missing host".into()).is_retryable());
    }

    #[test]
    fn timeout_message() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "SMTP conversation timed out after 30s");
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn attachment_error_mentions_path() {
        let err = Error::AttachmentRead {
            path: PathBuf::from("/tmp/missing.pdf"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing.pdf"));
        assert_eq!(err.kind(), ErrorKind::AttachmentRead);
    }

    #[test]
    fn kinds() {
        assert_eq!(Error::Configuration("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(Error::InvalidAddress("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(Error::Tls("x".into()).kind(), ErrorKind::Tls);
        assert_eq!(
            Error::ConnectionClosed(ConversationState::Ehlo).kind(),
            ErrorKind::Connection
        );
    }
}
