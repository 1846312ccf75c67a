//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which performs one streaming
//! download attempt with proper timeout configuration and error handling.
//! Retrying is the caller's business (see [`super::RetryingFetcher`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CHUNK_SIZE, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::{PathClaims, display_name, resolve_filename};
use super::progress::ProgressReporter;
use crate::user_agent;

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling. Cloning is cheap and shares the pool.
///
/// # Example
///
/// ```no_run
/// use linkdl_core::download::{HttpClient, PathClaims, ProgressReporter};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let path = client
///     .download_once(
///         "https://example.com/file.zip",
///         Path::new("./downloads"),
///         &PathClaims::new(),
///         &ProgressReporter::hidden(),
///     )
///     .await?;
/// println!("Downloaded: {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between body reads
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// The page fetch shares this client so both phases reuse one pool.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a single download attempt of `url` into `output_dir`.
    ///
    /// The filename is determined by:
    /// 1. Content-Disposition header (if present)
    /// 2. URL path (last segment, as written in the URL)
    /// 3. A hash of the URL when the path ends in `/`
    ///
    /// The destination is claimed in `claims` for the duration of the transfer,
    /// truncated, and the body is streamed into it in slices of at most 8 KiB
    /// while a byte bar advances in `progress`.
    ///
    /// A failed attempt may leave a partial file behind; the next attempt for
    /// the same URL truncates it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Reading the body or writing to disk fails
    #[instrument(skip(self, claims, progress), fields(output_dir = %output_dir.display()))]
    pub async fn download_once(
        &self,
        url: &str,
        output_dir: &Path,
        claims: &PathClaims,
        progress: &ProgressReporter,
    ) -> Result<PathBuf, DownloadError> {
        let parsed_url = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.send_get(url).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok());
        let filename = resolve_filename(content_disposition, &parsed_url);
        let claim = claims.claim(output_dir, &filename);
        let file_path = claim.path().to_path_buf();
        debug!(filename = %filename, path = %file_path.display(), "resolved output path");

        let total_bytes = response.content_length().unwrap_or(0);
        let bar = progress.file_bar(&display_name(&filename), total_bytes);

        let file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        let streamed = stream_to_file(file, response, url, &file_path, |written| {
            bar.inc(written as u64);
        })
        .await;
        bar.finish_and_clear();
        let bytes_written = streamed?;

        info!(path = %file_path.display(), bytes = bytes_written, "download complete");
        Ok(file_path)
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

/// Streams the response body to `file`, returning bytes written.
///
/// Network chunks are split into slices of at most [`CHUNK_SIZE`] bytes;
/// `on_write` is called with the length of each slice after it is written.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    mut on_write: impl FnMut(usize),
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        for slice in chunk.chunks(CHUNK_SIZE) {
            writer
                .write_all(slice)
                .await
                .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;
            bytes_written += slice.len() as u64;
            on_write(slice.len());
        }
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
