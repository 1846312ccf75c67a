//! Download coordinator running a batch of URLs through a fixed worker pool.
//!
//! The [`DownloadCoordinator`] turns each URL into a [`DownloadTask`], queues
//! them all on a channel and starts `min(concurrency, n)` workers. Each worker
//! takes one task, runs it to completion through a [`Fetch`] implementation
//! (retries included) and only then takes the next. Outcomes flow back on a
//! result channel and are collected in completion order.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use linkdl_core::download::{DownloadCoordinator, HttpClient, RetryPolicy, RetryingFetcher};
//! use linkdl_core::report::ErrorLog;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let error_log = Arc::new(ErrorLog::new("error_log.txt"));
//! let fetcher = Arc::new(RetryingFetcher::new(HttpClient::new(), RetryPolicy::default(), error_log));
//! let coordinator = DownloadCoordinator::new(5)?;
//! let urls = vec!["https://example.com/a.zip".to_string()];
//! let (outcomes, stats) = coordinator
//!     .download_all_with_stats(fetcher, &urls, Path::new("./downloads"))
//!     .await?;
//! println!("{} outcomes, {} completed, {} failed", outcomes.len(), stats.completed(), stats.failed());
//! # Ok(())
//! # }
//! ```

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, warn};

use super::fetcher::Fetch;
use super::progress::ProgressReporter;
use super::task::{DownloadOutcome, DownloadTask};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Error reported for a task whose fetch panicked.
const PANIC_MESSAGE: &str = "download task panicked";

/// Error type for download coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The destination directory could not be created.
    #[error("cannot create download directory {path}: {source}")]
    CreateDir {
        /// The directory that was requested.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Statistics from a download batch run.
///
/// `retried` counts extra attempts: a URL that succeeded on its third attempt
/// adds 2.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successfully completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of tasks processed (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    /// Returns the number of retry attempts made.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    fn record(&self, outcome: &DownloadOutcome) {
        if outcome.is_success() {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        let extra = outcome.attempts().saturating_sub(1) as usize;
        self.retried.fetch_add(extra, Ordering::SeqCst);
    }
}

/// Runs download tasks through a bounded pool of workers.
///
/// # Concurrency Model
///
/// - All tasks are queued up front on an unbounded channel
/// - `min(concurrency, n)` Tokio tasks share the receiver behind a mutex
/// - A worker finishes its current task, retries included, before taking another
/// - A panicking fetch is caught and reported as a [`DownloadOutcome::Failure`]
#[derive(Debug, Clone)]
pub struct DownloadCoordinator {
    concurrency: usize,
    progress: ProgressReporter,
}

impl DownloadCoordinator {
    /// Creates a coordinator allowing at most `concurrency` downloads at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        debug!(concurrency, "creating download coordinator");
        Ok(Self {
            concurrency,
            progress: ProgressReporter::hidden(),
        })
    }

    /// Draws the batch bar and outcome lines on `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Downloads every URL into `destination_dir`, one outcome per URL.
    ///
    /// Outcomes are in completion order. Duplicate URLs are separate tasks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CreateDir`] if `destination_dir` cannot be
    /// created. Individual download failures do NOT cause this method to error.
    pub async fn download_all(
        &self,
        fetcher: Arc<dyn Fetch>,
        urls: &[String],
        destination_dir: &Path,
    ) -> Result<Vec<DownloadOutcome>, EngineError> {
        let (outcomes, _stats) = self
            .download_all_with_stats(fetcher, urls, destination_dir)
            .await?;
        Ok(outcomes)
    }

    /// Like [`DownloadCoordinator::download_all`], also returning batch statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CreateDir`] if `destination_dir` cannot be created.
    #[instrument(skip(self, fetcher, urls), fields(urls = urls.len(), dir = %destination_dir.display()))]
    pub async fn download_all_with_stats(
        &self,
        fetcher: Arc<dyn Fetch>,
        urls: &[String],
        destination_dir: &Path,
    ) -> Result<(Vec<DownloadOutcome>, DownloadStats), EngineError> {
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|source| EngineError::CreateDir {
                path: destination_dir.to_path_buf(),
                source,
            })?;

        let stats = DownloadStats::new();
        if urls.is_empty() {
            info!("no urls to download");
            return Ok((Vec::new(), stats));
        }

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        for url in urls {
            // Receiver is alive in this scope, so send cannot fail.
            let _ = task_tx.send(DownloadTask::new(url.as_str(), destination_dir));
        }
        drop(task_tx);

        let queue = Arc::new(Mutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let worker_count = self.concurrency.min(urls.len());
        info!(workers = worker_count, tasks = urls.len(), "starting downloads");

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            handles.push(tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&fetcher),
                Arc::clone(&queue),
                result_tx.clone(),
            )));
        }
        drop(result_tx);

        let batch = self.progress.batch_bar(urls.len() as u64);
        let mut outcomes = Vec::with_capacity(urls.len());
        while let Some(outcome) = result_rx.recv().await {
            stats.record(&outcome);
            self.progress.println(outcome.to_string());
            batch.inc(1);
            outcomes.push(outcome);
        }
        batch.finish_and_clear();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "download worker ended abnormally");
            }
        }

        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            retried = stats.retried(),
            total = stats.total(),
            "downloads complete"
        );
        Ok((outcomes, stats))
    }
}

#[instrument(level = "debug", skip(fetcher, queue, results))]
async fn run_worker(
    worker_id: usize,
    fetcher: Arc<dyn Fetch>,
    queue: Arc<Mutex<UnboundedReceiver<DownloadTask>>>,
    results: UnboundedSender<DownloadOutcome>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(task) = next else {
            debug!("queue drained");
            break;
        };

        let outcome = match AssertUnwindSafe(fetcher.fetch(&task)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(url = %task.url, "download task panicked");
                DownloadOutcome::failure(&task.url, PANIC_MESSAGE, 0)
            }
        };

        if results.send(outcome).is_err() {
            warn!("result channel closed, stopping worker");
            break;
        }
    }
}
