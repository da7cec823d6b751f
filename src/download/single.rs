//! Sequential whole-object download with temp-file staging.
//!
//! The fallback strategy, and the only strategy when the remote size is
//! unknown or below the chunk threshold. Streams the body into
//! `<final>.part`; the engine validates the artifact and renames it over
//! the final path. Every retry restarts the transfer from byte zero.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::progress::ProgressTracker;
use super::retry::RetryPolicy;

/// Outcome of a successful single-stream attempt.
#[derive(Debug)]
pub(crate) struct SingleStreamOutcome {
    /// Bytes written to the part file (0 when skipped).
    pub bytes_written: u64,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// True when the final file already existed with the declared size and
    /// no transfer was issued.
    pub skipped: bool,
}

/// Straight-line GET-to-file transfer with retry.
#[derive(Debug, Clone)]
pub(crate) struct SingleStreamDownloader {
    retry: RetryPolicy,
}

impl SingleStreamDownloader {
    pub(crate) fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Downloads `url` into `part_path`.
    ///
    /// Skip rule: when the file at `final_path` already exists and its size
    /// equals the origin's declared length, the transfer is skipped and
    /// reported as success.
    ///
    /// # Errors
    ///
    /// Returns the last error and the total attempt count once the retry
    /// budget is exhausted. No partial file remains at `part_path` on error.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn download(
        &self,
        client: &HttpClient,
        url: &str,
        headers: &[(String, String)],
        final_path: &Path,
        part_path: &Path,
        declared_len: Option<u64>,
        progress: &ProgressTracker,
    ) -> Result<SingleStreamOutcome, (DownloadError, u32)> {
        if already_complete(final_path, declared_len).await {
            info!(path = %final_path.display(), "file exists with matching size, skipping download");
            return Ok(SingleStreamOutcome {
                bytes_written: 0,
                attempts: 0,
                skipped: true,
            });
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(attempt, url, "attempting single-stream download");

            match self
                .attempt(client, url, headers, final_path, part_path, declared_len, progress)
                .await
            {
                Ok(outcome) => {
                    return Ok(SingleStreamOutcome {
                        attempts: attempt,
                        ..outcome
                    });
                }
                Err(error) => {
                    // Never leave partial bytes behind between attempts.
                    let _ = tokio::fs::remove_file(part_path).await;
                    match self.retry.should_retry(attempt) {
                        Some(delay) => {
                            warn!(
                                url,
                                attempt,
                                max_attempts = self.retry.max_attempts(),
                                delay_ms = delay.as_millis(),
                                %error,
                                "single-stream attempt failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err((error, attempt)),
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn attempt(
        &self,
        client: &HttpClient,
        url: &str,
        headers: &[(String, String)],
        final_path: &Path,
        part_path: &Path,
        declared_len: Option<u64>,
        progress: &ProgressTracker,
    ) -> Result<SingleStreamOutcome, DownloadError> {
        let response = client.get(url, headers, None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        // The response's own declaration wins over the probe's.
        let expected = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .or(declared_len);

        // A probe may have failed earlier; re-check the skip rule against
        // the length this response declares before burning the transfer.
        if already_complete(final_path, expected).await {
            info!(path = %final_path.display(), "file exists with matching size, skipping transfer");
            return Ok(SingleStreamOutcome {
                bytes_written: 0,
                attempts: 0,
                skipped: true,
            });
        }

        let file = File::create(part_path)
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| DownloadError::network(url, e))?;
            writer
                .write_all(&bytes)
                .await
                .map_err(|e| DownloadError::io(part_path, e))?;
            bytes_written += bytes.len() as u64;
            progress.record(bytes.len() as u64);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;

        if let Some(expected) = expected
            && expected != bytes_written
        {
            return Err(DownloadError::length_mismatch(url, expected, bytes_written));
        }

        debug!(
            path = %part_path.display(),
            bytes = bytes_written,
            "single-stream transfer complete"
        );

        Ok(SingleStreamOutcome {
            bytes_written,
            attempts: 0,
            skipped: false,
        })
    }
}

/// Whether the final file already holds exactly the declared length.
async fn already_complete(final_path: &Path, declared_len: Option<u64>) -> bool {
    let Some(declared) = declared_len.filter(|len| *len > 0) else {
        return false;
    };
    tokio::fs::metadata(final_path)
        .await
        .is_ok_and(|meta| meta.len() == declared)
}
