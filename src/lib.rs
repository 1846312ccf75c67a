//! linkdl Core Library
//!
//! Finds the links on a web page that best match a set of keywords, and
//! downloads lists of links concurrently with retry.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`matcher`] - Fuzzy partial-ratio ranking of links against keywords
//! - [`page`] - Page fetch and `<a href>` extraction
//! - [`download`] - Streaming downloads, retry, and the worker-pool coordinator
//! - [`report`] - Ranking report, link file, keyword file and error log
//! - [`config`] - Optional config file with CLI defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod matcher;
pub mod page;
pub mod report;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS, DownloadCoordinator, DownloadError,
    DownloadOutcome, DownloadStats, DownloadTask, EngineError, Fetch, HttpClient, RetryPolicy,
    RetryingFetcher,
};
pub use matcher::{KeywordResults, Link, Matcher, rank};
pub use page::{PageError, extract_links, fetch_page};
pub use report::{ErrorLog, ErrorLogEntry, ReportError};
