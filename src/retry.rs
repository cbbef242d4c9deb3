use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    /// Growth factor between attempts; `1.0` keeps the interval fixed.
    pub multiplier: f64,
    pub max_delay: Duration,
    /// `None` retries until the store comes up or shutdown is requested.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 1.0,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    /// A handle that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // Sender gone without cancelling: nothing will ever cancel us.
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("store rejected the connection: {0}")]
    Fatal(#[source] sqlx::Error),
    #[error("store still unreachable after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: sqlx::Error,
    },
    #[error("connection attempt cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

// PostgreSQL reports 57P03 while starting, class 08 for connection exceptions
// and 53300 when out of slots. Anything else will not fix itself.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(code) => code == "57P03" || code == "53300" || code.starts_with("08"),
            None => false,
        },
        _ => false,
    }
}

/// Run `attempt` until it yields a connection.
///
/// Exactly one successful result is returned; no attempt is made after it.
pub async fn connect_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    shutdown: &Shutdown,
    mut attempt: F,
) -> Result<T, ConnectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempts: u32 = 0;
    loop {
        if shutdown.is_cancelled() {
            return Err(ConnectError::Cancelled { attempts });
        }
        attempts += 1;

        let err = match attempt().await {
            Ok(conn) => {
                if attempts > 1 {
                    info!(attempts, "store connection established");
                }
                return Ok(conn);
            }
            Err(err) => err,
        };

        if !is_transient(&err) {
            error!(attempts, error = %err, "store connection failed permanently");
            return Err(ConnectError::Fatal(err));
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            error!(attempts, error = %err, "giving up on store connection");
            return Err(ConnectError::Exhausted { attempts, last: err });
        }

        let delay = policy.delay_after(attempts);
        warn!(
            attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "store not reachable yet, retrying"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => {
                return Err(ConnectError::Cancelled { attempts });
            }
        }
    }
}
