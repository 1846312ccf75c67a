//! Keyword file reading.

use std::path::Path;

use tracing::{debug, instrument};

use super::ReportError;

/// Splits keyword-file text into keywords: one per line, trimmed, blanks skipped.
#[must_use]
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the keywords in `path`.
///
/// # Errors
///
/// Returns [`ReportError::NotFound`] if the file is missing and
/// [`ReportError::Io`] for other read failures.
#[instrument(fields(path = %path.display()))]
pub async fn read_keywords(path: &Path) -> Result<Vec<String>, ReportError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReportError::read("keyword", path, e))?;
    let keywords = parse_keywords(&text);
    debug!(count = keywords.len(), "read keywords");
    Ok(keywords)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_keywords_skips_blank_lines_and_trims() {
        let keywords = parse_keywords("mario\n\n  zelda  \n\t\nmetroid\r\n");
        assert_eq!(keywords, vec!["mario", "zelda", "metroid"]);
    }

    #[tokio::test]
    async fn test_read_keywords_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("keywords.txt");
        std::fs::write(&path, "mario\nzelda\n").unwrap();

        assert_eq!(read_keywords(&path).await.unwrap(), vec!["mario", "zelda"]);
    }

    #[tokio::test]
    async fn test_read_keywords_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.txt");

        let err = read_keywords(&path).await.unwrap_err();
        assert!(matches!(err, ReportError::NotFound { kind: "keyword", .. }));
        assert!(err.to_string().contains("absent.txt"));
    }
}
