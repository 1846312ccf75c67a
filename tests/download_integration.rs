//! Integration tests for the download coordinator with the retrying fetcher
//! against a mock HTTP server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use linkdl_core::download::{
    DownloadCoordinator, DownloadOutcome, HttpClient, ProgressReporter, RetryPolicy,
    RetryingFetcher,
};
use linkdl_core::report::ErrorLog;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

fn fetcher(temp: &TempDir, max_attempts: u32, progress: &ProgressReporter) -> Arc<RetryingFetcher> {
    let error_log = Arc::new(ErrorLog::new(temp.path().join("error_log.txt")));
    Arc::new(
        RetryingFetcher::new(
            HttpClient::new(),
            RetryPolicy::with_max_attempts(max_attempts),
            error_log,
        )
        .with_progress(progress.clone()),
    )
}

/// Holds each request open for `delay_ms` while counting overlapping requests.
///
/// The blocking sleep keeps the counter raised while other requests arrive.
struct ConcurrencyTrackingResponder {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    delay_ms: u64,
}

impl Respond for ConcurrencyTrackingResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let current_count = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current_count, Ordering::SeqCst);

        std::thread::sleep(Duration::from_millis(self.delay_ms));

        self.current.fetch_sub(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_bytes(b"content")
    }
}

#[tokio::test]
async fn test_two_workers_never_exceed_two_requests() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new()?;
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    Mock::given(method("GET"))
        .respond_with(ConcurrencyTrackingResponder {
            current: Arc::clone(&current),
            peak: Arc::clone(&peak),
            delay_ms: 100,
        })
        .expect(5)
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..5)
        .map(|i| format!("{}/file{i}.bin", mock_server.uri()))
        .collect();
    let progress = ProgressReporter::hidden();
    let coordinator = DownloadCoordinator::new(2)?;

    let outcomes = coordinator
        .download_all(fetcher(&temp, 3, &progress), &urls, &temp.path().join("dl"))
        .await?;

    assert_eq!(outcomes.len(), 5);
    assert!(outcomes.iter().all(DownloadOutcome::is_success));
    let observed = peak.load(Ordering::SeqCst);
    assert!(observed <= 2, "peak concurrent requests was {observed}");

    let mut returned: Vec<&str> = outcomes.iter().map(DownloadOutcome::url).collect();
    returned.sort_unstable();
    let mut expected: Vec<&str> = urls.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(returned, expected);

    for i in 0..5 {
        let written = std::fs::read(temp.path().join("dl").join(format!("file{i}.bin")))?;
        assert_eq!(written, b"content");
    }
    Ok(())
}

#[tokio::test]
async fn test_mixed_batch_logs_only_final_failures() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new()?;

    Mock::given(method("GET"))
        .and(path("/good.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"good"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let good = format!("{}/good.zip", mock_server.uri());
    let gone = format!("{}/gone.zip", mock_server.uri());
    let progress = ProgressReporter::capturing();
    let coordinator = DownloadCoordinator::new(5)?.with_progress(progress.clone());

    let (outcomes, stats) = coordinator
        .download_all_with_stats(
            fetcher(&temp, 2, &progress),
            &[good.clone(), gone.clone()],
            temp.path(),
        )
        .await?;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(stats.completed(), 1);
    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.retried(), 1);

    let messages = progress.messages();
    assert!(messages.contains(&format!("Retrying {gone} (1/2)...")));
    assert!(
        messages
            .iter()
            .any(|line| line.starts_with(&format!("Failed to download {gone}: ")))
    );
    assert!(
        messages
            .iter()
            .any(|line| line.starts_with(&format!("Downloaded {good} to ")))
    );

    let log = std::fs::read_to_string(temp.path().join("error_log.txt"))?;
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&format!("Failed to download {gone} after 2 attempts: ")));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_urls_each_produce_an_outcome() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new()?;

    Mock::given(method("GET"))
        .and(path("/same.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"same")
                .set_delay(Duration::from_millis(50)),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/same.zip", mock_server.uri());
    let coordinator = DownloadCoordinator::new(3)?;
    let progress = ProgressReporter::hidden();

    let outcomes = coordinator
        .download_all(fetcher(&temp, 1, &progress), &vec![url.clone(); 3], temp.path())
        .await?;

    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        assert_eq!(outcome.url(), url);
        let local = outcome.local_filename().ok_or("expected success")?;
        assert_eq!(std::fs::read(local)?, b"same");
    }
    Ok(())
}

#[tokio::test]
async fn test_content_disposition_names_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    let temp = TempDir::new()?;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"Game (USA).zip\"")
                .set_body_bytes(b"zipdata"),
        )
        .mount(&mock_server)
        .await;

    let coordinator = DownloadCoordinator::new(1)?;
    let progress = ProgressReporter::hidden();
    let outcomes = coordinator
        .download_all(
            fetcher(&temp, 1, &progress),
            &[format!("{}/get?id=7", mock_server.uri())],
            temp.path(),
        )
        .await?;

    let local = outcomes[0].local_filename().ok_or("expected success")?;
    assert_eq!(local.file_name().and_then(|n| n.to_str()), Some("Game (USA).zip"));
    Ok(())
}
