//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid MIME header (bad name or a value that would inject new lines).
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Message has no body part.
    #[error("Message has no text body")]
    MissingBody,
}
