//! Concurrent byte-range download with a bounded worker pool.
//!
//! One task per planned chunk, at most `max_concurrent_chunks` in flight.
//! Chunks may complete in any order; the downloader joins every task before
//! judging the aggregate, and the whole attempt succeeds only if every
//! chunk does. A permanently failed chunk never cancels its siblings;
//! their results are simply discarded by the engine when the aggregate is
//! a failure.
//!
//! Each task opens its own handle on the pre-sized part file, so the
//! seek-then-write pair stays private to one task. A single shared handle
//! would let one task's seek land between another task's seek and write.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::plan::{ChunkPlan, ChunkSpec};
use super::progress::ProgressTracker;
use super::retry::RetryPolicy;

/// Per-chunk result, written exactly once by the worker owning the index.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Index of the chunk within the plan.
    pub index: usize,
    /// Bytes written at the chunk's offset (0 unless successful).
    pub bytes_written: u64,
    /// Whether the chunk completed after at most `max_attempts` tries.
    pub success: bool,
    /// Attempts consumed by this chunk.
    pub attempts: u32,
    /// The error that exhausted the retry budget, if any.
    pub last_error: Option<String>,
}

/// Executes a [`ChunkPlan`] against a pre-sized output file.
#[derive(Debug, Clone)]
pub(crate) struct ChunkedDownloader {
    concurrency: usize,
    retry: RetryPolicy,
}

impl ChunkedDownloader {
    pub(crate) fn new(concurrency: usize, retry: RetryPolicy) -> Self {
        Self { concurrency, retry }
    }

    /// Downloads every chunk of `plan` into `part_path` and reports one
    /// outcome per chunk, in plan order.
    ///
    /// The caller judges the aggregate: the attempt is a success only if
    /// **all** outcomes are.
    #[instrument(skip_all, fields(url = %url, chunks = plan.len(), concurrency = self.concurrency))]
    pub(crate) async fn download(
        &self,
        client: &HttpClient,
        url: &str,
        headers: &[(String, String)],
        plan: &ChunkPlan,
        part_path: &Path,
        progress: &Arc<ProgressTracker>,
    ) -> Vec<ChunkOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(plan.len());

        for spec in plan.chunks() {
            let spec = *spec;
            let semaphore = Arc::clone(&semaphore);
            let client = client.clone();
            let url = url.to_string();
            let headers = headers.to_vec();
            let part_path = part_path.to_path_buf();
            let retry = self.retry.clone();
            let progress = Arc::clone(progress);

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return failed_outcome(spec.index, 0, "worker pool closed unexpectedly");
                };
                download_chunk_with_retry(
                    &client, &url, &headers, spec, &part_path, &retry, &progress,
                )
                .await
            }));
        }

        // Barrier: every chunk task finishes (success or permanent failure)
        // before the aggregate outcome is decided.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => {
                    warn!(index, %join_error, "chunk task panicked or was cancelled");
                    outcomes.push(failed_outcome(index, 0, join_error.to_string()));
                }
            }
        }
        outcomes
    }
}

fn failed_outcome(index: usize, attempts: u32, error: impl Into<String>) -> ChunkOutcome {
    ChunkOutcome {
        index,
        bytes_written: 0,
        success: false,
        attempts,
        last_error: Some(error.into()),
    }
}

/// Downloads one chunk, retrying independently of its siblings.
async fn download_chunk_with_retry(
    client: &HttpClient,
    url: &str,
    headers: &[(String, String)],
    spec: ChunkSpec,
    part_path: &Path,
    retry: &RetryPolicy,
    progress: &ProgressTracker,
) -> ChunkOutcome {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        debug!(index = spec.index, attempt, "attempting chunk download");

        match download_chunk(client, url, headers, spec, part_path, progress).await {
            Ok(bytes_written) => {
                debug!(
                    index = spec.index,
                    bytes = bytes_written,
                    "chunk complete"
                );
                return ChunkOutcome {
                    index: spec.index,
                    bytes_written,
                    success: true,
                    attempts: attempt,
                    last_error: None,
                };
            }
            Err(error) => match retry.should_retry(attempt) {
                Some(delay) => {
                    warn!(
                        index = spec.index,
                        attempt,
                        max_attempts = retry.max_attempts(),
                        delay_ms = delay.as_millis(),
                        %error,
                        "chunk attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(index = spec.index, attempt, %error, "chunk permanently failed");
                    return failed_outcome(spec.index, attempt, error.to_string());
                }
            },
        }
    }
}

/// One transfer attempt for one chunk.
///
/// Only a 206 response is acceptable: a 200 means the origin ignored the
/// `Range` header, and writing its body would put the whole object into
/// this chunk's sub-range, so the attempt fails before reading any of it.
async fn download_chunk(
    client: &HttpClient,
    url: &str,
    headers: &[(String, String)],
    spec: ChunkSpec,
    part_path: &Path,
    progress: &ProgressTracker,
) -> Result<u64, DownloadError> {
    let range = spec.range_header();
    let response = client.get(url, headers, Some(&range)).await?;

    let status = response.status();
    if status != StatusCode::PARTIAL_CONTENT {
        if status.is_success() {
            return Err(DownloadError::range_not_supported(url, status.as_u16()));
        }
        return Err(DownloadError::http_status(url, status.as_u16()));
    }

    // Own handle per task; seek and write never interleave across tasks.
    let mut file = OpenOptions::new()
        .write(true)
        .open(part_path)
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;
    file.seek(SeekFrom::Start(spec.start))
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;

    let expected = spec.len();
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| DownloadError::network(url, e))?;
        let incoming = bytes.len() as u64;
        if bytes_written + incoming > expected {
            // The origin is sending more than the requested range; writing
            // it would spill into a sibling chunk's bytes.
            return Err(DownloadError::length_mismatch(
                url,
                expected,
                bytes_written + incoming,
            ));
        }
        writer
            .write_all(&bytes)
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;
        bytes_written += incoming;
        progress.record(incoming);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;

    if bytes_written != expected {
        return Err(DownloadError::length_mismatch(url, expected, bytes_written));
    }

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use crate::download::plan::plan_chunks;

    /// Serves byte ranges of a fixed body: 206 with the requested slice, or
    /// 200 with the whole body when no `Range` header is present.
    struct RangeResponder {
        body: Vec<u8>,
    }

    impl Respond for RangeResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let range = request
                .headers
                .get("Range")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_range);
            match range {
                Some((start, end)) if (end as usize) < self.body.len() => {
                    let slice = self.body[start as usize..=end as usize].to_vec();
                    ResponseTemplate::new(206)
                        .insert_header(
                            "Content-Range",
                            format!("bytes {start}-{end}/{}", self.body.len()),
                        )
                        .set_body_bytes(slice)
                }
                _ => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
            }
        }
    }

    fn parse_range(value: &str) -> Option<(u64, u64)> {
        let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }

    fn patterned_body(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn presized_part(dir: &TempDir, name: &str, len: u64) -> PathBuf {
        let path = dir.path().join(name);
        let file = tokio::fs::File::create(&path).await.unwrap();
        file.set_len(len).await.unwrap();
        path
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_all_chunks_reassemble_exact_body() {
        let mock_server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let body = patterned_body(10_000);

        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(RangeResponder { body: body.clone() })
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/clip.mp4", mock_server.uri());
        let plan = plan_chunks(body.len() as u64, 3000);
        let part_path = presized_part(&dir, "clip.mp4.part", body.len() as u64).await;
        let progress = Arc::new(ProgressTracker::new("clip.mp4", Some(body.len() as u64)));

        let downloader = ChunkedDownloader::new(3, fast_retry(3));
        let outcomes = downloader
            .download(&client, &url, &[], &plan, &part_path, &progress)
            .await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(
            outcomes.iter().map(|o| o.bytes_written).sum::<u64>(),
            body.len() as u64
        );
        assert_eq!(std::fs::read(&part_path).unwrap(), body);
    }

    #[tokio::test]
    async fn test_range_ignored_by_origin_fails_every_chunk() {
        let mock_server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let body = patterned_body(6000);

        // Origin answers 200 with the full body no matter what was asked.
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(4) // 2 chunks x 2 attempts
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/clip.mp4", mock_server.uri());
        let plan = plan_chunks(body.len() as u64, 3000);
        let part_path = presized_part(&dir, "clip.mp4.part", body.len() as u64).await;
        let progress = Arc::new(ProgressTracker::new("clip.mp4", Some(body.len() as u64)));

        let downloader = ChunkedDownloader::new(2, fast_retry(2));
        let outcomes = downloader
            .download(&client, &url, &[], &plan, &part_path, &progress)
            .await;

        assert!(outcomes.iter().all(|o| !o.success));
        assert!(outcomes.iter().all(|o| o.attempts == 2));
        assert!(
            outcomes
                .iter()
                .all(|o| o.last_error.as_deref().is_some_and(|e| e.contains("range"))),
            "outcomes: {outcomes:?}"
        );
    }

    #[tokio::test]
    async fn test_truncated_chunk_body_is_length_mismatch() {
        /// 206 responses that deliver half the requested range.
        struct TruncatingResponder {
            body: Vec<u8>,
        }

        impl Respond for TruncatingResponder {
            fn respond(&self, request: &Request) -> ResponseTemplate {
                let range = request
                    .headers
                    .get("Range")
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_range);
                match range {
                    Some((start, end)) => {
                        let half = start + (end - start) / 2;
                        let slice = self.body[start as usize..=half as usize].to_vec();
                        ResponseTemplate::new(206).set_body_bytes(slice)
                    }
                    None => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
                }
            }
        }

        let mock_server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let body = patterned_body(4000);

        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(TruncatingResponder { body: body.clone() })
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/clip.mp4", mock_server.uri());
        let plan = plan_chunks(body.len() as u64, 2000);
        let part_path = presized_part(&dir, "clip.mp4.part", body.len() as u64).await;
        let progress = Arc::new(ProgressTracker::new("clip.mp4", Some(body.len() as u64)));

        let downloader = ChunkedDownloader::new(2, fast_retry(2));
        let outcomes = downloader
            .download(&client, &url, &[], &plan, &part_path, &progress)
            .await;

        assert!(outcomes.iter().all(|o| !o.success));
        assert!(
            outcomes.iter().all(|o| {
                o.last_error
                    .as_deref()
                    .is_some_and(|e| e.contains("length mismatch"))
            }),
            "outcomes: {outcomes:?}"
        );
    }

    #[tokio::test]
    async fn test_error_status_on_chunk_is_reported() {
        let mock_server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/gone.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/gone.mp4", mock_server.uri());
        let plan = plan_chunks(1000, 1000);
        let part_path = presized_part(&dir, "gone.mp4.part", 1000).await;
        let progress = Arc::new(ProgressTracker::new("gone.mp4", Some(1000)));

        let downloader = ChunkedDownloader::new(1, fast_retry(1));
        let outcomes = downloader
            .download(&client, &url, &[], &plan, &part_path, &progress)
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(
            outcomes[0]
                .last_error
                .as_deref()
                .is_some_and(|e| e.contains("404"))
        );
    }
}
