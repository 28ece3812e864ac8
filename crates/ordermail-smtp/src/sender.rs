//! High-level send API.
//!
//! [`MailSender`] validates an [`EmailData`], renders the message, opens the
//! connection and drives a [`Conversation`] to its end under a single
//! [`TimeoutGuard`]. Every call produces exactly one [`Outcome`].

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::SenderOptions;
use crate::connection::{SmtpStream, TlsSettings, Transport};
use crate::email::{EmailData, MessageStamp};
use crate::error::{Error, ErrorKind, Result};
use crate::protocol::{Conversation, Step};
use crate::timeout::TimeoutGuard;

/// Read buffer size for server replies.
const READ_BUFFER_SIZE: usize = 4096;

/// Message reported when the server accepted the email.
pub const SUCCESS_MESSAGE: &str = "Email sent successfully";

/// Terminal result of one send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// True if the server accepted the message.
    pub success: bool,
    /// Human-readable result. On failure it carries the reply code, state
    /// and server text where available.
    pub message: String,
    /// Failure class, `None` on success.
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
    /// True if the failure is worth retrying later.
    #[serde(skip)]
    pub retryable: bool,
}

impl Outcome {
    /// Creates a success outcome.
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            kind: None,
            retryable: false,
        }
    }

    /// Creates a failure outcome from an error.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            kind: Some(err.kind()),
            retryable: err.is_retryable(),
        }
    }
}

/// Records the first terminal event of a conversation.
///
/// Later events are logged and dropped.
#[derive(Debug, Default)]
struct Completion {
    outcome: Option<Outcome>,
}

impl Completion {
    /// Records `result` unless an outcome exists. Returns true if recorded.
    fn finish(&mut self, result: Result<()>) -> bool {
        if let Some(first) = &self.outcome {
            match result {
                Ok(()) => debug!(first = %first.message, "ignoring late success"),
                Err(err) => debug!(first = %first.message, error = %err, "ignoring late error"),
            }
            return false;
        }

        let outcome = match result {
            Ok(()) => {
                info!("email sent");
                Outcome::success()
            }
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "email not sent");
                Outcome::failure(&err)
            }
        };
        self.outcome = Some(outcome);
        true
    }

    fn into_outcome(self) -> Outcome {
        self.outcome.unwrap_or_else(|| {
            Outcome::failure(&Error::InvalidState(
                "conversation ended without a result".into(),
            ))
        })
    }
}

/// Sends order confirmation emails.
///
/// Holds no connection state; every call opens its own connection. Cheap to
/// clone.
///
/// ```ignore
/// let sender = MailSender::new(SenderOptions::default());
/// let outcome = sender.send(&email).await;
/// if !outcome.success {
///     eprintln!("{}", outcome.message);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MailSender {
    options: SenderOptions,
}

impl MailSender {
    /// Creates a sender.
    #[must_use]
    pub const fn new(options: SenderOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &SenderOptions {
        &self.options
    }

    /// Sends `data` over a new TCP connection to `data.server`.
    pub async fn send(&self, data: &EmailData) -> Outcome {
        self.run(data, None::<SmtpStream>).await
    }

    /// Sends `data` over an already open transport.
    pub async fn send_over<T: Transport>(&self, data: &EmailData, transport: T) -> Outcome {
        self.run(data, Some(transport)).await
    }

    /// Sends `data` on a background task.
    #[must_use]
    pub fn spawn(&self, data: EmailData) -> JoinHandle<Outcome> {
        let sender = self.clone();
        tokio::spawn(async move { sender.send(&data).await })
    }

    async fn run<T: Transport>(&self, data: &EmailData, transport: Option<T>) -> Outcome {
        info!(
            recipient = %data.recipient.address,
            host = %data.server.host,
            port = data.server.port,
            "sending email"
        );

        let mut completion = Completion::default();
        let mut guard = TimeoutGuard::arm(self.options.timeout_duration());

        let timed_out = tokio::select! {
            () = self.deliver(data, transport, &mut completion) => false,
            () = guard.expired() => true,
        };
        guard.disarm();

        if timed_out {
            completion.finish(Err(Error::Timeout(guard.duration())));
        }
        completion.into_outcome()
    }

    async fn deliver<T: Transport>(
        &self,
        data: &EmailData,
        transport: Option<T>,
        completion: &mut Completion,
    ) {
        let conversation = match self.prepare(data).await {
            Ok(conversation) => conversation,
            Err(err) => {
                completion.finish(Err(err));
                return;
            }
        };

        let host = data.server.host.trim();
        match transport {
            Some(mut transport) => {
                self.converse(conversation, &mut transport, host, completion)
                    .await;
            }
            None => match SmtpStream::connect(host, data.server.port).await {
                Ok(mut stream) => {
                    self.converse(conversation, &mut stream, host, completion)
                        .await;
                }
                Err(err) => {
                    completion.finish(Err(err));
                }
            },
        }
    }

    /// Validates the input, loads the attachment and renders the message.
    async fn prepare(&self, data: &EmailData) -> Result<Conversation> {
        data.validate()?;

        let attachment = match &data.attachment {
            Some(source) => source.load().await?,
            None => None,
        };
        let message = data.compose(attachment, &MessageStamp::now(), self.options.mailer_name())?;
        debug!(bytes = message.len(), "message composed");

        let host = data.server.host.trim();
        Ok(Conversation::new(
            self.options.helo_name_for(host)?,
            data.credentials(),
            data.envelope()?,
            message,
        )
        .with_dot_stuffing(self.options.uses_dot_stuffing()))
    }

    async fn converse<T: Transport>(
        &self,
        mut conversation: Conversation,
        transport: &mut T,
        host: &str,
        completion: &mut Completion,
    ) {
        let tls = self.options.tls_settings();
        let result = drive(&mut conversation, transport, host, &tls).await;
        completion.finish(result);

        if let Err(err) = transport.shutdown().await {
            debug!(error = %err, "ignoring socket error after termination");
        }
    }
}

/// Runs the conversation over `transport` until it completes or fails.
async fn drive<T: Transport>(
    conversation: &mut Conversation,
    transport: &mut T,
    host: &str,
    tls: &TlsSettings,
) -> Result<()> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut filled = 0;
    let mut next = None;

    loop {
        let step = match next.take() {
            Some(step) => Some(step),
            None => {
                let step = conversation.handle_input(&buf[..filled]);
                filled = 0;
                step?
            }
        };

        match step {
            None => {
                let n = match transport.read(&mut buf).await {
                    Ok(n) => n,
                    Err(err) => return disconnected(conversation, err.into()),
                };
                if n == 0 {
                    let state = conversation.state();
                    return disconnected(conversation, Error::ConnectionClosed(state));
                }
                trace!(bytes = n, "received");
                filled = n;
            }
            Some(Step::Send(transmit)) => {
                debug!(state = %conversation.state(), data = %transmit.label, "sending");
                if let Err(err) = transport.write_all(&transmit.data).await {
                    return disconnected(conversation, err.into());
                }
            }
            Some(Step::UpgradeTls) => {
                if !transport.supports_upgrade() {
                    return conversation.fail(Error::Tls(
                        "server offered STARTTLS but the transport cannot be upgraded".into(),
                    ));
                }
                if let Err(err) = transport.upgrade_to_tls(host, tls).await {
                    return conversation.fail(err);
                }
                next = Some(conversation.on_tls_established()?);
            }
            Some(Step::Complete) => return Ok(()),
        }
    }
}

/// Socket errors once `QUIT` is on the wire do not fail the send.
fn disconnected(conversation: &mut Conversation, err: Error) -> Result<()> {
    if conversation.state().tolerates_disconnect() {
        debug!(error = %err, "connection dropped after QUIT");
        return Ok(());
    }
    conversation.fail(err)
}
