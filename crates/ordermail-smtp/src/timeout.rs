//! Whole-conversation deadline.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Default budget for one send.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One-shot deadline covering connect, TLS handshake and every exchange.
#[derive(Debug)]
pub struct TimeoutGuard {
    duration: Duration,
    deadline: Instant,
    armed: bool,
}

impl TimeoutGuard {
    /// Arms a guard that expires `duration` from now.
    #[must_use]
    pub fn arm(duration: Duration) -> Self {
        Self {
            duration,
            deadline: Instant::now() + duration,
            armed: true,
        }
    }

    /// Returns the configured budget.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Stops the guard. Returns `true` only on the first call.
    pub fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    /// Completes at the deadline. Never completes once disarmed.
    pub async fn expired(&self) {
        if self.armed {
            sleep_until(self.deadline).await;
        } else {
            std::future::pending::<()>().await;
        }
    }
}
