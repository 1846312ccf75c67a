//! Append-only log of downloads that failed for good.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::ReportError;

/// Default error log path, relative to the working directory.
pub const DEFAULT_ERROR_LOG: &str = "error_log.txt";

/// One final download failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogEntry {
    /// The URL that could not be downloaded.
    pub url: String,
    /// Attempts made before giving up.
    pub attempts_made: u32,
    /// Message of the last error.
    pub last_error: String,
}

/// Renders the log line, without the trailing newline.
impl fmt::Display for ErrorLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to download {} after {} attempts: {}",
            self.url, self.attempts_made, self.last_error
        )
    }
}

/// Append-only error log shared by all download workers.
///
/// Appends are serialized by an async mutex so concurrent failures never
/// interleave within a line. The file is opened in append mode for each entry
/// and only created when the first failure is recorded; existing content is
/// never rewritten.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ErrorLog {
    /// Creates a log that appends to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as a single line.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if the file cannot be opened or written.
    #[instrument(skip(self, entry), fields(path = %self.path.display(), url = %entry.url))]
    pub async fn append(&self, entry: &ErrorLogEntry) -> Result<(), ReportError> {
        let line = format!("{entry}\n");

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ReportError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ReportError::io(&self.path, e))?;
        file.flush().await.map_err(|e| ReportError::io(&self.path, e))?;

        debug!("recorded download failure");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    fn entry(url: &str) -> ErrorLogEntry {
        ErrorLogEntry {
            url: url.to_string(),
            attempts_made: 3,
            last_error: "HTTP 503 downloading somewhere".to_string(),
        }
    }

    #[test]
    fn test_entry_format() {
        assert_eq!(
            entry("https://x.test/a.zip").to_string(),
            "Failed to download https://x.test/a.zip after 3 attempts: HTTP 503 downloading somewhere"
        );
    }

    #[tokio::test]
    async fn test_log_not_created_until_first_failure() {
        let temp = TempDir::new().unwrap();
        let log = ErrorLog::new(temp.path().join("errors.txt"));
        assert!(!log.path().exists());

        log.append(&entry("https://x.test/a")).await.unwrap();
        assert!(log.path().exists());
    }

    #[tokio::test]
    async fn test_append_preserves_existing_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("errors.txt");
        std::fs::write(&path, "earlier run\n").unwrap();

        let log = ErrorLog::new(&path);
        log.append(&entry("https://x.test/a")).await.unwrap();
        log.append(&entry("https://x.test/b")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier run");
        assert!(lines[1].contains("https://x.test/a"));
        assert!(lines[2].contains("https://x.test/b"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(ErrorLog::new(temp.path().join("errors.txt")));

        let mut handles = Vec::new();
        for i in 0..50 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                log.append(&entry(&format!("https://x.test/{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|line| line.starts_with("Failed to download https://x.test/")
            && line.ends_with("after 3 attempts: HTTP 503 downloading somewhere")));
    }

    #[tokio::test]
    async fn test_append_to_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let log = ErrorLog::new(temp.path().join("no/such/dir/errors.txt"));
        let result = log.append(&entry("https://x.test/a")).await;
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
