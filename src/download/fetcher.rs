//! Single-URL download with bounded, sequential retry.
//!
//! [`RetryingFetcher`] runs the attempt loop for one [`DownloadTask`]:
//! each attempt returns a `Result`, a failed attempt either prints a retry
//! notice and loops or, once the [`RetryPolicy`] is exhausted, records an
//! [`ErrorLogEntry`] and ends in [`DownloadOutcome::Failure`]. Nothing escapes
//! the fetcher as an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::filename::PathClaims;
use super::progress::ProgressReporter;
use super::retry::{RetryDecision, RetryPolicy};
use super::task::{DownloadOutcome, DownloadTask};
use crate::report::{ErrorLog, ErrorLogEntry};

/// Something that turns a [`DownloadTask`] into its [`DownloadOutcome`].
///
/// The coordinator drives any implementation through its worker pool.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Downloads `task.url`, retrying as configured. Never fails: errors end
    /// up in [`DownloadOutcome::Failure`].
    async fn fetch(&self, task: &DownloadTask) -> DownloadOutcome;
}

/// The production [`Fetch`]: HTTP attempts through [`HttpClient`] under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: HttpClient,
    policy: RetryPolicy,
    error_log: Arc<ErrorLog>,
    progress: ProgressReporter,
    claims: PathClaims,
}

impl RetryingFetcher {
    /// Creates a fetcher that records final failures in `error_log`.
    #[must_use]
    pub fn new(client: HttpClient, policy: RetryPolicy, error_log: Arc<ErrorLog>) -> Self {
        Self {
            client,
            policy,
            error_log,
            progress: ProgressReporter::hidden(),
            claims: PathClaims::new(),
        }
    }

    /// Sends retry notices and per-file bars to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the error log failures are appended to.
    #[must_use]
    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    async fn record_failure(&self, url: &str, attempts_made: u32, last_error: &str) {
        let entry = ErrorLogEntry {
            url: url.to_string(),
            attempts_made,
            last_error: last_error.to_string(),
        };
        if let Err(e) = self.error_log.append(&entry).await {
            warn!(url = %url, error = %e, "failed to write error log entry");
        }
    }
}

#[async_trait]
impl Fetch for RetryingFetcher {
    #[instrument(skip(self, task), fields(url = %task.url))]
    async fn fetch(&self, task: &DownloadTask) -> DownloadOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting download");

            let error = match self
                .client
                .download_once(&task.url, &task.destination_dir, &self.claims, &self.progress)
                .await
            {
                Ok(path) => return DownloadOutcome::success(&task.url, path, attempt),
                Err(e) => e,
            };

            match self.policy.should_retry(attempt) {
                RetryDecision::Retry { delay, .. } => {
                    info!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying download"
                    );
                    self.progress.println(format!(
                        "Retrying {} ({attempt}/{max_attempts})...",
                        task.url
                    ));
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(attempts = attempt, error = %error, %reason, "download failed");
                    let last_error = error.to_string();
                    self.record_failure(&task.url, attempt, &last_error).await;
                    return DownloadOutcome::failure(&task.url, last_error, attempt);
                }
            }
        }
    }
}
