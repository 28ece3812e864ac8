//! TCP stream with in-place STARTTLS upgrade.

use std::io;
use std::mem;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::Transport;
use super::tls::{TlsSettings, server_name};
use crate::error::{Error, Result};

/// SMTP stream (TCP or TLS).
#[derive(Debug, Default)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Plain(TcpStream),
    /// TLS-encrypted connection.
    Tls(Box<TlsStream<TcpStream>>),
    /// Stream lost during a failed upgrade.
    #[default]
    Closed,
}

impl SmtpStream {
    /// Connects to an SMTP server over plain TCP.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        debug!(host, port, "connected");
        Ok(Self::Plain(stream))
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream closed")
}

impl Transport for SmtpStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf).await,
            Self::Tls(stream) => stream.read(buf).await,
            Self::Closed => Err(closed()),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
            Self::Closed => Err(closed()),
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.shutdown().await,
            Self::Tls(stream) => stream.shutdown().await,
            Self::Closed => Ok(()),
        }
    }

    fn supports_upgrade(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    async fn upgrade_to_tls(&mut self, host: &str, settings: &TlsSettings) -> Result<()> {
        let name = server_name(host)?;
        let tcp = match mem::take(self) {
            Self::Plain(tcp) => tcp,
            other => {
                *self = other;
                return Err(Error::Tls("stream is not a plain TCP connection".into()));
            }
        };

        let tls = settings
            .connector()
            .connect(name, tcp)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;

        debug!(host, "TLS established");
        *self = Self::Tls(Box::new(tls));
        Ok(())
    }
}
