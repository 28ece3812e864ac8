//! `ordermail` - send order confirmation emails from the command line.
//!
//! Reads an [`EmailData`](ordermail_smtp::EmailData) job from a JSON file and
//! sends it over SMTP.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod job;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ordermail_smtp::{MailSender, SenderOptions};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for failures worth retrying (sysexits `EX_TEMPFAIL`).
const EX_TEMPFAIL: u8 = 75;

/// Order confirmation mailer
#[derive(Parser, Debug)]
#[command(name = "ordermail")]
#[command(about = "Sends order confirmation emails over SMTP")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a job
    Send {
        /// Job file (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Conversation time budget in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Verify the server certificate during STARTTLS
        #[arg(long)]
        verify_certs: bool,

        /// Escape body lines starting with a dot
        #[arg(long)]
        dot_stuffing: bool,

        /// Name sent in EHLO (defaults to the server host)
        #[arg(long)]
        helo: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a job without connecting
    Check {
        /// Job file (JSON)
        #[arg(short, long)]
        job: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_filter = if args.debug {
        "ordermail=debug,ordermail_smtp=debug"
    } else {
        "ordermail=info,ordermail_smtp=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Send {
            job,
            timeout,
            verify_certs,
            dot_stuffing,
            helo,
            json,
        } => {
            let mut data = job::load(&job)?;
            job::apply_password(&mut data, std::env::var(job::PASSWORD_ENV).ok());

            let mut options = SenderOptions::new()
                .timeout(Duration::from_secs(timeout))
                .accept_invalid_certs(!verify_certs)
                .dot_stuffing(dot_stuffing);
            if let Some(helo) = helo {
                options = options.helo_name(helo);
            }

            info!(job = %job.display(), "starting");
            let outcome = MailSender::new(options).send(&data).await;

            if json {
                println!("{}", serde_json::to_string(&outcome)?);
            } else {
                println!("{}", outcome.message);
            }

            Ok(if outcome.success {
                ExitCode::SUCCESS
            } else if outcome.retryable {
                ExitCode::from(EX_TEMPFAIL)
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check { job } => {
            let mut data = job::load(&job)?;
            job::apply_password(&mut data, std::env::var(job::PASSWORD_ENV).ok());
            data.validate()?;
            println!("{}: OK", job.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
