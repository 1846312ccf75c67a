//! Concurrent HTTP downloads streamed to disk.
//!
//! # Features
//!
//! - Streaming downloads in chunks of at most 8 KiB
//! - Filename from Content-Disposition, else the last URL path segment
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Bounded sequential retry per URL, final failures appended to an error log
//! - Fixed worker pool with per-file and batch progress bars
//!
//! # Example
//!
//! ```no_run
//! use linkdl_core::download::{HttpClient, PathClaims, ProgressReporter};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let file_path = client
//!     .download_once(
//!         "https://example.com/archive.zip",
//!         Path::new("./downloads"),
//!         &PathClaims::new(),
//!         &ProgressReporter::hidden(),
//!     )
//!     .await?;
//! println!("Downloaded: {}", file_path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod fetcher;
mod filename;
mod progress;
mod retry;
mod task;

pub use client::HttpClient;
pub use engine::{DEFAULT_CONCURRENCY, DownloadCoordinator, DownloadStats, EngineError};
pub use error::DownloadError;
pub use fetcher::{Fetch, RetryingFetcher};
pub use filename::{PathClaim, PathClaims, display_name};
pub use progress::ProgressReporter;
pub use retry::{DEFAULT_MAX_ATTEMPTS, MAX_ATTEMPTS_LIMIT, RetryDecision, RetryPolicy};
pub use task::{DownloadOutcome, DownloadTask};
