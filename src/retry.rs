//! Retry with exponential backoff for transport failures
//!
//! Only requests that never got an answer are retried (connection refused,
//! reset, timed out). An error status is the service's answer and is returned
//! as is.
//!
//! ```no_run
//! use build3d_dock::config::RetryConfig;
//! use build3d_dock::retry::with_retry;
//!
//! # async fn example() -> build3d_dock::Result<()> {
//! let client = reqwest::Client::new();
//! let response = with_retry(&RetryConfig::default(), || async {
//!     client
//!         .get("https://tldr.docking.org/api/results/download/42")
//!         .send()
//!         .await
//!         .map_err(build3d_dock::Error::from)
//! })
//! .await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{error, info, warn};

/// Classifies errors as transient or final
pub trait IsRetryable {
    /// Whether repeating the operation could succeed
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                ErrorKind::TimedOut
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::BrokenPipe
                    | ErrorKind::Interrupted
            ),
            Error::Job(_)
            | Error::Docking(_)
            | Error::Config { .. }
            | Error::Yaml(_)
            | Error::Extraction { .. }
            | Error::NoArtifacts
            | Error::Interrupted
            | Error::Serialization(_)
            | Error::NotSupported(_)
            | Error::Other(_) => false,
        }
    }
}

/// Delay schedule for one retried operation
struct Backoff<'a> {
    config: &'a RetryConfig,
    next: Duration,
}

impl<'a> Backoff<'a> {
    fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            next: config.initial_delay,
        }
    }

    /// Delay before the upcoming retry; grows the following one
    fn advance(&mut self) -> Duration {
        let base = self.next;
        let grown = base.as_secs_f64() * self.config.backoff_multiplier;
        self.next = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.config.max_delay)
            .min(self.config.max_delay);

        if self.config.jitter {
            add_jitter(base)
        } else {
            base
        }
    }
}

/// Run `operation`, retrying retryable errors up to `config.max_attempts` times
///
/// The first call is not counted, so `max_attempts = 0` disables retrying.
/// Returns the first success or the last error.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);
    let mut retries = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    info!(retries, "request succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(err);
        }
        if retries >= config.max_attempts {
            error!(error = %err, retries, "giving up on request");
            return Err(err);
        }

        retries += 1;
        let delay = backoff.advance();
        warn!(
            error = %err,
            retry = retries,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Stretch `delay` by a random 0-100%
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
        .ok()
        .and_then(|extra| delay.checked_add(extra))
        .unwrap_or(delay)
}
