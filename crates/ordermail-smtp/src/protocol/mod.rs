//! Sans-I/O SMTP conversation.
//!
//! [`Conversation`] decides which command to send next from the reply it was
//! given, without touching a socket. The caller owns the I/O:
//!
//! - Feed received bytes with [`Conversation::handle_input`]
//! - Write every [`Step::Send`] to the server
//! - On [`Step::UpgradeTls`], upgrade the transport and call
//!   [`Conversation::on_tls_established`]
//! - Stop on [`Step::Complete`] or on the first `Err`
//!
//! # Example
//!
//! ```ignore
//! let mut conversation = Conversation::new("smtp.example.com", credentials, envelope, message);
//!
//! loop {
//!     let n = socket.read(&mut buf).await?;
//!     match conversation.handle_input(&buf[..n])? {
//!         None => continue,
//!         Some(Step::Send(transmit)) => socket.write_all(&transmit.data).await?,
//!         Some(Step::UpgradeTls) => { /* upgrade, then on_tls_established() */ }
//!         Some(Step::Complete) => break,
//!     }
//! }
//! ```

mod state;
mod transmit;

pub use state::ConversationState;
pub use transmit::{Transmit, dot_stuff};

use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::ReplyParser;
use crate::types::{Address, Reply, ReplyCode};

/// What the I/O layer has to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write these bytes, then wait for the next reply.
    Send(Transmit),
    /// Upgrade the transport to TLS, then call
    /// [`Conversation::on_tls_established`].
    UpgradeTls,
    /// The conversation ended successfully.
    Complete,
}

/// AUTH LOGIN credentials.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Envelope addresses (`MAIL FROM` / `RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path.
    pub from: Address,
    /// Single forward path.
    pub to: Address,
}

/// Sans-I/O SMTP client conversation for a single message.
#[derive(Debug)]
pub struct Conversation {
    state: ConversationState,
    parser: ReplyParser,
    hostname: String,
    credentials: Credentials,
    envelope: Envelope,
    message: Vec<u8>,
    dot_stuffing: bool,
    upgrade_pending: bool,
    encrypted: bool,
}

impl Conversation {
    /// Creates a conversation waiting for the server greeting.
    ///
    /// `hostname` is sent in `EHLO`; `message` is the complete RFC 5322
    /// message written during the DATA phase.
    #[must_use]
    pub fn new(
        hostname: impl Into<String>,
        credentials: Credentials,
        envelope: Envelope,
        message: Vec<u8>,
    ) -> Self {
        Self {
            state: ConversationState::Connecting,
            parser: ReplyParser::new(),
            hostname: hostname.into(),
            credentials,
            envelope,
            message,
            dot_stuffing: false,
            upgrade_pending: false,
            encrypted: false,
        }
    }

    /// Enables dot-stuffing of the message body.
    #[must_use]
    pub const fn with_dot_stuffing(mut self, enabled: bool) -> Self {
        self.dot_stuffing = enabled;
        self
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.state
    }

    /// Returns true once STARTTLS completed.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Feeds received bytes.
    ///
    /// Returns `Ok(None)` until a complete reply is buffered. At most one
    /// reply is processed per call; call again with an empty slice to drain
    /// replies that arrived together.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is malformed or not accepted in the
    /// current state. The conversation is then `Failed`.
    pub fn handle_input(&mut self, data: &[u8]) -> Result<Option<Step>> {
        if self.state.is_terminal() {
            return Err(Error::InvalidState(format!(
                "input received after conversation ended ({})",
                self.state
            )));
        }
        if self.upgrade_pending {
            return self.fail(Error::Tls(
                "server sent data before the TLS handshake".into(),
            ));
        }

        match self.parser.feed(data) {
            Ok(Some(reply)) => self.on_reply(&reply).map(Some),
            Ok(None) => Ok(None),
            Err(err) => self.fail(err),
        }
    }

    /// Advances the conversation with a complete reply.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the reply code is not the one the current
    /// state accepts. The conversation is then `Failed`.
    pub fn on_reply(&mut self, reply: &Reply) -> Result<Step> {
        debug!(state = %self.state, code = %reply.code, "reply received");

        let code = reply.code;
        let step = match self.state {
            ConversationState::Connecting if code == ReplyCode::SERVICE_READY => {
                self.send(ConversationState::Ehlo, &self.ehlo())
            }
            ConversationState::Ehlo if code == ReplyCode::OK => {
                if reply.mentions("STARTTLS") {
                    self.send(ConversationState::StartTls, &Command::StartTls)
                } else if reply.mentions("AUTH") {
                    self.send(ConversationState::AuthUser, &Command::AuthLogin)
                } else {
                    self.send(ConversationState::MailFrom, &self.mail_from())
                }
            }
            ConversationState::StartTls if code == ReplyCode::SERVICE_READY => {
                if !self.parser.is_empty() {
                    return self.fail(Error::Tls(
                        "unexpected plaintext data after STARTTLS".into(),
                    ));
                }
                self.upgrade_pending = true;
                Step::UpgradeTls
            }
            ConversationState::EhloAfterTls if code == ReplyCode::OK => {
                self.send(ConversationState::AuthUser, &Command::AuthLogin)
            }
            ConversationState::AuthUser if code == ReplyCode::AUTH_CONTINUE => {
                let command = Command::auth_response(&self.credentials.username);
                self.send(ConversationState::AuthPass, &command)
            }
            ConversationState::AuthPass if code == ReplyCode::AUTH_CONTINUE => {
                let command = Command::auth_response(&self.credentials.password);
                self.send(ConversationState::AuthResult, &command)
            }
            ConversationState::AuthResult if code == ReplyCode::AUTH_SUCCESS => {
                self.send(ConversationState::MailFrom, &self.mail_from())
            }
            ConversationState::MailFrom if code == ReplyCode::OK => {
                let command = Command::RcptTo {
                    to: self.envelope.to.clone(),
                };
                self.send(ConversationState::RcptTo, &command)
            }
            ConversationState::RcptTo if code == ReplyCode::OK => {
                self.send(ConversationState::Data, &Command::Data)
            }
            ConversationState::Data if code == ReplyCode::START_DATA => {
                self.advance(ConversationState::Body);
                Step::Send(Transmit::message_body(&self.message, self.dot_stuffing))
            }
            ConversationState::Body if code == ReplyCode::OK => {
                self.send(ConversationState::Quit, &Command::Quit)
            }
            ConversationState::Quit if code == ReplyCode::CLOSING || code == ReplyCode::OK => {
                self.advance(ConversationState::Finished);
                Step::Complete
            }
            state => {
                return self.fail(Error::protocol(code.as_u16(), state, reply.raw_text()));
            }
        };

        Ok(step)
    }

    /// Resumes after the transport was upgraded to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if no upgrade was requested.
    pub fn on_tls_established(&mut self) -> Result<Step> {
        if !self.upgrade_pending {
            return self.fail(Error::InvalidState(format!(
                "TLS established in state {} without STARTTLS",
                self.state
            )));
        }
        self.upgrade_pending = false;
        self.encrypted = true;
        self.parser.clear();
        Ok(self.send(ConversationState::EhloAfterTls, &self.ehlo()))
    }

    /// Marks the conversation failed and returns `err`.
    ///
    /// # Errors
    ///
    /// Always returns `err`.
    pub fn fail<T>(&mut self, err: Error) -> Result<T> {
        if !self.state.is_terminal() {
            debug!(from = %self.state, error = %err, "conversation failed");
            self.state = ConversationState::Failed;
        }
        Err(err)
    }

    fn ehlo(&self) -> Command {
        Command::Ehlo {
            hostname: self.hostname.clone(),
        }
    }

    fn mail_from(&self) -> Command {
        Command::MailFrom {
            from: self.envelope.from.clone(),
        }
    }

    fn send(&mut self, next: ConversationState, command: &Command) -> Step {
        self.advance(next);
        Step::Send(Transmit::command(command))
    }

    fn advance(&mut self, next: ConversationState) {
        debug_assert!(next > self.state, "{} -> {next} is not forward", self.state);
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
