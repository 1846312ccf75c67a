//! Text files the tool reads and writes.
//!
//! - [`write_keyword_results`] writes the ranking report, one block per keyword.
//! - [`read_link_file`] reads a list of URLs back, ignoring every other line.
//! - [`read_keywords`] reads the keyword file, one keyword per line.
//! - [`ErrorLog`] appends one line per download that failed for good.

mod error_log;
mod keywords;
mod links;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use error_log::{DEFAULT_ERROR_LOG, ErrorLog, ErrorLogEntry};
pub use keywords::{parse_keywords, read_keywords};
pub use links::{
    DEFAULT_REPORT_FILE, format_keyword_results, parse_link_lines, read_link_file,
    write_keyword_results,
};

/// Errors reading or writing report files.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An input file does not exist.
    #[error("{kind} file {path} not found")]
    NotFound {
        /// Which input was missing ("keyword", "link").
        kind: &'static str,
        /// The missing path.
        path: PathBuf,
    },

    /// Any other I/O failure.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a read failure, turning `NotFound` into [`ReportError::NotFound`].
    pub(crate) fn read(kind: &'static str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            Self::io(path, source)
        }
    }
}
