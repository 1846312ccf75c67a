//! Ranking report writing and link-file reading.
//!
//! Report format, one block per keyword:
//!
//! ```text
//! --- mario ---
//! https://example.com/Super%20Mario%20Bros.zip
//! https://example.com/Super%20Mario%20World.zip
//!
//! --- zelda ---
//!
//! ```
//!
//! Reading the report back keeps only the URL lines, so the header and blank
//! lines drop out.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::ReportError;
use crate::matcher::KeywordResults;

/// Default ranking report path, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "links.txt";

/// Lines accepted as download URLs.
#[allow(clippy::expect_used)]
static LINK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("link regex is valid")); // Static pattern, safe to panic

/// Renders `results` in report format.
#[must_use]
pub fn format_keyword_results(results: &KeywordResults) -> String {
    let mut out = String::new();
    for (keyword, hrefs) in results {
        let _ = writeln!(out, "--- {keyword} ---");
        for href in hrefs {
            let _ = writeln!(out, "{href}");
        }
        out.push('\n');
    }
    out
}

/// Writes `results` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the file cannot be written.
#[instrument(skip(results), fields(path = %path.display(), keywords = results.len()))]
pub async fn write_keyword_results(results: &KeywordResults, path: &Path) -> Result<(), ReportError> {
    tokio::fs::write(path, format_keyword_results(results))
        .await
        .map_err(|e| ReportError::io(path, e))?;
    debug!("wrote ranking report");
    Ok(())
}

/// Keeps the trimmed lines of `text` that start with `http://` or `https://`.
#[must_use]
pub fn parse_link_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| LINK_LINE.is_match(line))
        .map(str::to_string)
        .collect()
}

/// Reads the download URLs listed in `path`.
///
/// # Errors
///
/// Returns [`ReportError::NotFound`] if the file is missing and
/// [`ReportError::Io`] for other read failures.
#[instrument(fields(path = %path.display()))]
pub async fn read_link_file(path: &Path) -> Result<Vec<String>, ReportError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReportError::read("link", path, e))?;
    let links = parse_link_lines(&text);
    debug!(count = links.len(), "read link file");
    Ok(links)
}
