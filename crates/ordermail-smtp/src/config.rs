//! Sender options.

use std::time::Duration;

use crate::connection::TlsSettings;
use crate::error::{Error, Result};
use crate::timeout::DEFAULT_TIMEOUT;

/// Default `X-Mailer` header value.
pub const DEFAULT_MAILER: &str = concat!("ordermail/", env!("CARGO_PKG_VERSION"));

/// Tunables for [`crate::MailSender`].
///
/// ```
/// use std::time::Duration;
/// use ordermail_smtp::SenderOptions;
///
/// let options = SenderOptions::new()
///     .timeout(Duration::from_secs(10))
///     .accept_invalid_certs(false);
/// assert_eq!(options.timeout_duration(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderOptions {
    timeout: Duration,
    helo_name: Option<String>,
    accept_invalid_certs: bool,
    dot_stuffing: bool,
    mailer: String,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            helo_name: None,
            accept_invalid_certs: true,
            dot_stuffing: false,
            mailer: DEFAULT_MAILER.to_string(),
        }
    }
}

impl SenderOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whole-conversation time budget.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the name sent in `EHLO`. Defaults to the server host.
    #[must_use]
    pub fn helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = Some(name.into());
        self
    }

    /// Accepts invalid server certificates during STARTTLS. On by default.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Escapes body lines starting with `.`. Off by default.
    #[must_use]
    pub const fn dot_stuffing(mut self, enabled: bool) -> Self {
        self.dot_stuffing = enabled;
        self
    }

    /// Sets the `X-Mailer` header value.
    #[must_use]
    pub fn mailer(mut self, mailer: impl Into<String>) -> Self {
        self.mailer = mailer.into();
        self
    }

    /// Returns the time budget.
    #[must_use]
    pub const fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Returns the EHLO name for a server host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is empty or contains
    /// whitespace or control characters, which would end the `EHLO` line early.
    pub fn helo_name_for<'a>(&'a self, host: &'a str) -> Result<&'a str> {
        let name = self.helo_name.as_deref().unwrap_or(host);
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::Configuration(format!("invalid EHLO name {name:?}")));
        }
        Ok(name)
    }

    /// Returns true if body dot-stuffing is enabled.
    #[must_use]
    pub const fn uses_dot_stuffing(&self) -> bool {
        self.dot_stuffing
    }

    /// Returns the `X-Mailer` value.
    #[must_use]
    pub fn mailer_name(&self) -> &str {
        &self.mailer
    }

    /// Returns the TLS settings derived from these options.
    #[must_use]
    pub const fn tls_settings(&self) -> TlsSettings {
        TlsSettings {
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}
