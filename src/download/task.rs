//! Download tasks and their outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

/// One URL to fetch into a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// The URL to download.
    pub url: String,
    /// Directory the file is written into.
    pub destination_dir: PathBuf,
}

impl DownloadTask {
    /// Creates a task for `url`.
    pub fn new(url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination_dir: destination_dir.into(),
        }
    }
}

/// How a [`DownloadTask`] ended. Every task produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was written completely.
    Success {
        /// The downloaded URL.
        url: String,
        /// Path of the written file.
        local_filename: PathBuf,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed.
    Failure {
        /// The URL that could not be downloaded.
        url: String,
        /// Message of the error that ended the last attempt.
        last_error: String,
        /// Number of attempts made.
        attempts_made: u32,
    },
}

impl DownloadOutcome {
    /// Creates a success outcome.
    pub fn success(url: impl Into<String>, local_filename: impl Into<PathBuf>, attempts: u32) -> Self {
        Self::Success {
            url: url.into(),
            local_filename: local_filename.into(),
            attempts,
        }
    }

    /// Creates a failure outcome.
    pub fn failure(url: impl Into<String>, last_error: impl Into<String>, attempts_made: u32) -> Self {
        Self::Failure {
            url: url.into(),
            last_error: last_error.into(),
            attempts_made,
        }
    }

    /// The URL this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    /// Returns `true` for [`DownloadOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Path of the written file, for successes.
    #[must_use]
    pub fn local_filename(&self) -> Option<&Path> {
        match self {
            Self::Success { local_filename, .. } => Some(local_filename),
            Self::Failure { .. } => None,
        }
    }

    /// Attempts made for this URL.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } => *attempts,
            Self::Failure { attempts_made, .. } => *attempts_made,
        }
    }
}

/// The one-line summary printed when a task completes.
impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                url,
                local_filename,
                ..
            } => write!(f, "Downloaded {url} to {}", local_filename.display()),
            Self::Failure { url, last_error, .. } => {
                write!(f, "Failed to download {url}: {last_error}")
            }
        }
    }
}
