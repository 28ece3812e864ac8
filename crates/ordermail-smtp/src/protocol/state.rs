//! Conversation state types.
//!
//! States are declared in the order a conversation passes through them, so
//! the derived `Ord` reflects progress: every transition moves to a strictly
//! greater state.

use std::fmt;

/// Position of an SMTP conversation.
///
/// ```text
/// Connecting ─ 220 → Ehlo ─ 250 ┬ STARTTLS → StartTls ─ 220 → (upgrade) → EhloAfterTls ─ 250 ┐
///                               ├ AUTH ───────────────────────────────────────────────────── ┴→ AuthUser
///                               └ neither ──────────────────────────────────────────────────────→ MailFrom
/// AuthUser ─ 334 → AuthPass ─ 334 → AuthResult ─ 235 → MailFrom ─ 250 → RcptTo ─ 250 → Data
/// Data ─ 354 → Body ─ 250 → Quit ─ 221/250 → Finished
/// ```
///
/// `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ConversationState {
    /// Waiting for the server greeting.
    #[default]
    Connecting,
    /// `EHLO` sent.
    Ehlo,
    /// `STARTTLS` sent.
    StartTls,
    /// `EHLO` re-sent over the encrypted channel.
    EhloAfterTls,
    /// `AUTH LOGIN` sent, waiting for the username challenge.
    AuthUser,
    /// Username sent, waiting for the password challenge.
    AuthPass,
    /// Password sent.
    AuthResult,
    /// `MAIL FROM` sent.
    MailFrom,
    /// `RCPT TO` sent.
    RcptTo,
    /// `DATA` sent.
    Data,
    /// Message body and terminating dot sent.
    Body,
    /// `QUIT` sent.
    Quit,
    /// Conversation ended successfully.
    Finished,
    /// Conversation ended with an error.
    Failed,
}

impl ConversationState {
    /// Returns `true` once the conversation has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// Returns `true` if socket errors in this state no longer matter.
    ///
    /// The message has been accepted once `QUIT` is on the wire, so a reset
    /// at that point is not a delivery failure.
    #[must_use]
    pub const fn tolerates_disconnect(self) -> bool {
        matches!(self, Self::Quit | Self::Finished)
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Ehlo => "Ehlo",
            Self::StartTls => "StartTls",
            Self::EhloAfterTls => "EhloAfterTls",
            Self::AuthUser => "AuthUser",
            Self::AuthPass => "AuthPass",
            Self::AuthResult => "AuthResult",
            Self::MailFrom => "MailFrom",
            Self::RcptTo => "RcptTo",
            Self::Data => "Data",
            Self::Body => "Body",
            Self::Quit => "Quit",
            Self::Finished => "Finished",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
