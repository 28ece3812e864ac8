//! Scripted SMTP server used by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use ordermail_smtp::{Contact, EmailData, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Routes client logs to the test harness. `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the server saw.
#[derive(Debug, Default)]
pub struct Transcript {
    /// Command lines in arrival order, without CRLF.
    pub commands: Vec<String>,
    /// DATA payload without the terminating dot line.
    pub body: Option<String>,
}

impl Transcript {
    /// Returns true if any command starts with `prefix`.
    pub fn sent(&self, prefix: &str) -> bool {
        self.commands.iter().any(|c| c.starts_with(prefix))
    }
}

/// Server greeting and the reply to each client command, in order.
pub struct Script {
    pub greeting: &'static str,
    pub replies: Vec<&'static str>,
    pub byte_by_byte: bool,
}

impl Script {
    pub fn new(greeting: &'static str, replies: &[&'static str]) -> Self {
        Self {
            greeting,
            replies: replies.to_vec(),
            byte_by_byte: false,
        }
    }

    pub const fn byte_by_byte(mut self) -> Self {
        self.byte_by_byte = true;
        self
    }
}

/// Plain server without extensions, accepting everything.
pub const PLAIN_SESSION: &[&str] = &[
    "250 smtp.test\r\n",
    "250 2.1.0 OK\r\n",
    "250 2.1.5 OK\r\n",
    "354 End data with <CR><LF>.<CR><LF>\r\n",
    "250 2.0.0 queued as 42\r\n",
    "221 2.0.0 bye\r\n",
];

/// Server advertising AUTH only.
pub const AUTH_SESSION: &[&str] = &[
    "250-smtp.test\r\n250-AUTH LOGIN PLAIN\r\n250 8BITMIME\r\n",
    "334 VXNlcm5hbWU6\r\n",
    "334 UGFzc3dvcmQ6\r\n",
    "235 2.7.0 Authentication successful\r\n",
    "250 2.1.0 OK\r\n",
    "250 2.1.5 OK\r\n",
    "354 go ahead\r\n",
    "250 2.0.0 queued\r\n",
    "221 2.0.0 bye\r\n",
];

/// Plays `script` on `stream`, then waits for the client to close.
pub async fn run_script<S>(stream: S, script: Script) -> Transcript
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    let mut transcript = Transcript::default();

    write_reply(&mut stream, script.greeting, script.byte_by_byte).await;

    let mut in_data = false;
    for reply in script.replies {
        if in_data {
            match read_data(&mut stream).await {
                Some(body) => transcript.body = Some(body),
                None => return transcript,
            }
        } else {
            match read_command(&mut stream).await {
                Some(command) => transcript.commands.push(command),
                None => return transcript,
            }
        }
        write_reply(&mut stream, reply, script.byte_by_byte).await;
        in_data = reply.starts_with("354");
    }

    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
    transcript
}

/// Reads one command line. `None` at end of stream.
pub async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches("\r\n").to_string()),
    }
}

/// Reads DATA lines up to the lone `.` line.
pub async fn read_data<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut body = String::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return None,
            Ok(_) if line == ".\r\n" => return Some(body),
            Ok(_) => body.push_str(&line),
        }
    }
}

/// Writes a reply, optionally one byte at a time.
pub async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &str, byte_by_byte: bool) {
    if byte_by_byte {
        for byte in reply.as_bytes() {
            if writer.write_all(std::slice::from_ref(byte)).await.is_err() {
                return;
            }
            let _ = writer.flush().await;
            tokio::task::yield_now().await;
        }
    } else {
        let _ = writer.write_all(reply.as_bytes()).await;
        let _ = writer.flush().await;
    }
}

/// A complete, valid order confirmation job.
pub fn email(host: &str, port: u16) -> EmailData {
    EmailData {
        recipient: Contact::new("jan@example.test", "Jan Kowalski"),
        sender: Contact::new("orders@shop.test", "Shop"),
        reply_to: None,
        subject: "Order 123".into(),
        body: "Thank you for your order.\nThe confirmation is attached.".into(),
        attachment: None,
        server: ServerConfig {
            host: host.into(),
            port,
            username: "orders@shop.test".into(),
            password: "secret".into(),
            encryption: "STARTTLS".into(),
        },
    }
}
