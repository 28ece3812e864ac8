//! Byte-stream transports for the SMTP conversation.
//!
//! A [`Transport`] is a duplex byte stream that may be upgraded to TLS in
//! place (STARTTLS). [`SmtpStream`] is the TCP implementation;
//! [`Plaintext`] wraps any async stream that can never be upgraded.

mod stream;
mod tls;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub use stream::SmtpStream;
pub use tls::TlsSettings;

use crate::error::{Error, Result};

/// Duplex byte stream owned by one conversation.
pub trait Transport: Send {
    /// Reads available bytes into `buf`. Returns `0` at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Writes and flushes all of `data`.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Closes the write half of the stream.
    fn shutdown(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Returns true if [`Transport::upgrade_to_tls`] can succeed.
    fn supports_upgrade(&self) -> bool;

    /// Upgrades the stream to TLS in place.
    fn upgrade_to_tls(
        &mut self,
        host: &str,
        settings: &TlsSettings,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Transport over any async stream that cannot be upgraded to TLS.
///
/// Useful for in-memory streams and for servers reached through an already
/// secured tunnel.
#[derive(Debug)]
pub struct Plaintext<S>(pub S);

impl<S> Plaintext<S> {
    /// Wraps a stream.
    pub const fn new(stream: S) -> Self {
        Self(stream)
    }
}

impl<S> Transport for Plaintext<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.0.write_all(data).await?;
        self.0.flush().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.0.shutdown().await
    }

    fn supports_upgrade(&self) -> bool {
        false
    }

    async fn upgrade_to_tls(&mut self, _host: &str, _settings: &TlsSettings) -> Result<()> {
        Err(Error::Tls(
            "server offered STARTTLS but the transport cannot be upgraded".into(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plaintext_roundtrip() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut transport = Plaintext::new(client);

        transport.write_all(b"EHLO x\r\n").await.unwrap();
        let mut buf = [0u8; 8];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"EHLO x\r\n");

        server.write_all(b"250 ok\r\n").await.unwrap();
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"250 ok\r\n");
    }

    #[tokio::test]
    async fn test_plaintext_cannot_upgrade() {
        let (client, _server) = tokio::io::duplex(64);
        let mut transport = Plaintext::new(client);
        assert!(!transport.supports_upgrade());
        let err = transport
            .upgrade_to_tls("smtp.example.com", &TlsSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tls(_)));
    }

    #[tokio::test]
    async fn test_plaintext_eof() {
        let (client, server) = tokio::io::duplex(64);
        let mut transport = Plaintext::new(client);
        drop(server);
        let mut buf = [0u8; 8];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 0);
    }
}
