//! Download engine: strategy selection, fallback, validation, publish.
//!
//! The engine walks a fixed state machine per request:
//!
//! ```text
//! Probing -> {ChunkedAttempt | SingleStreamAttempt} -> Validating
//!         -> Published | Failed
//! ```
//!
//! Objects of known size at or above the chunk threshold are fetched with
//! concurrent byte-range requests; everything else takes the sequential
//! path. A failed chunked attempt falls back to single-stream exactly once.
//! Completed artifacts are validated before an atomic rename publishes them
//! at the final path, so a failed download never leaves a corrupted or
//! partial file there.
//!
//! # Example
//!
//! ```no_run
//! use media_downloader::{DownloadEngine, DownloadRequest, EngineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(EngineConfig::default())?;
//! let request = DownloadRequest::new(
//!     "https://example.com/media/clip.mp4",
//!     "clip.mp4",
//!     "./downloads",
//! )
//! .with_header("Referer", "https://example.com/post/1");
//! let result = engine.download(&request).await;
//! println!("success: {}, path: {}", result.success, result.final_path.display());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::chunked::ChunkedDownloader;
use super::client::HttpClient;
use super::config::EngineConfig;
use super::error::DownloadError;
use super::plan::plan_chunks;
use super::probe::probe_remote_object;
use super::progress::ProgressTracker;
use super::request::{DownloadRequest, DownloadResult};
use super::single::SingleStreamDownloader;
use super::validate::validate_media_file;

/// Minimum allowed chunk concurrency.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed chunk concurrency.
const MAX_CONCURRENCY: usize = 100;

/// Error type for engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid chunk concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Chunk size or threshold must be positive.
    #[error("invalid chunk size {value}: must be positive")]
    InvalidChunkSize {
        /// The invalid value that was provided.
        value: u64,
    },
}

/// Media download engine.
///
/// Holds an [`HttpClient`] (reused across requests for connection pooling)
/// and an explicit [`EngineConfig`]; no ambient global state.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: HttpClient,
    config: EngineConfig,
}

impl DownloadEngine {
    /// Creates an engine from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] when
    /// `max_concurrent_chunks` is outside 1-100 and
    /// [`EngineError::InvalidChunkSize`] when the chunk size or threshold
    /// is zero.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.max_concurrent_chunks) {
            return Err(EngineError::InvalidConcurrency {
                value: config.max_concurrent_chunks,
            });
        }
        if config.chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize { value: 0 });
        }
        if config.chunk_threshold == 0 {
            return Err(EngineError::InvalidChunkSize { value: 0 });
        }

        debug!(
            chunk_size = config.chunk_size,
            chunk_threshold = config.chunk_threshold,
            max_concurrent_chunks = config.max_concurrent_chunks,
            max_attempts = config.retry.max_attempts(),
            "creating download engine"
        );

        let client = HttpClient::with_timeouts(config.connect_timeout, config.read_timeout);
        Ok(Self { client, config })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Downloads one media artifact to `dest_dir/filename`.
    ///
    /// Never returns an error as control flow: every failure mode ends in a
    /// [`DownloadResult`] with `success: false` and no file at the final
    /// path.
    #[instrument(skip(self, request), fields(url = %request.url, filename = %request.filename))]
    pub async fn download(&self, request: &DownloadRequest) -> DownloadResult {
        let final_path = request.final_path();

        if Url::parse(&request.url).is_err() {
            let error = DownloadError::invalid_url(&request.url);
            warn!(%error, "rejecting request");
            return DownloadResult::failed(final_path, 0, error.to_string());
        }

        // Probing
        let remote = probe_remote_object(&self.client, &request.url, &request.headers).await;

        // Idempotent re-invocation: the artifact is already published.
        if let Some(total) = remote.total_size.filter(|t| *t > 0)
            && file_len(&final_path).await == Some(total)
        {
            info!(path = %final_path.display(), "file exists with matching size, skipping download");
            return DownloadResult::completed(final_path, total, 0);
        }

        if let Err(error) = tokio::fs::create_dir_all(&request.dest_dir).await {
            let error = DownloadError::io(&request.dest_dir, error);
            warn!(%error, "cannot create destination directory");
            return DownloadResult::failed(final_path, 0, error.to_string());
        }

        let part_path = request.part_path();
        let progress = Arc::new(ProgressTracker::new(&request.filename, remote.total_size));
        let mut attempts_used = 0u32;

        // ChunkedAttempt: known size at or above the threshold.
        if let Some(total) = remote.total_size.filter(|t| *t >= self.config.chunk_threshold) {
            if !remote.accepts_ranges {
                debug!("origin did not advertise range support, attempting chunked anyway");
            }
            match self
                .chunked_attempt(request, total, &part_path, &progress)
                .await
            {
                Ok(attempts) => {
                    attempts_used += attempts;
                    return self
                        .validate_and_publish(request, &part_path, final_path, total, attempts_used)
                        .await;
                }
                Err((attempts, reason)) => {
                    attempts_used += attempts;
                    warn!(reason = %reason, "chunked attempt failed, falling back to single-stream");
                    let _ = tokio::fs::remove_file(&part_path).await;
                }
            }
        } else {
            debug!(
                total_size = ?remote.total_size,
                threshold = self.config.chunk_threshold,
                "size unknown or below threshold, using single-stream"
            );
        }

        // SingleStreamAttempt: primary path for small/unknown objects and
        // the one-time fallback for failed chunked attempts.
        let single = SingleStreamDownloader::new(self.config.retry.clone());
        match single
            .download(
                &self.client,
                &request.url,
                &request.headers,
                &final_path,
                &part_path,
                remote.total_size,
                progress.as_ref(),
            )
            .await
        {
            Ok(outcome) if outcome.skipped => {
                let total = file_len(&final_path).await.unwrap_or(0);
                DownloadResult::completed(final_path, total, attempts_used)
            }
            Ok(outcome) => {
                attempts_used += outcome.attempts;
                self.validate_and_publish(
                    request,
                    &part_path,
                    final_path,
                    outcome.bytes_written,
                    attempts_used,
                )
                .await
            }
            Err((error, attempts)) => {
                attempts_used += attempts;
                warn!(%error, attempts_used, "download failed");
                DownloadResult::failed(final_path, attempts_used, error.to_string())
            }
        }
    }

    /// Pre-sizes the part file and runs the chunk plan.
    ///
    /// Returns the attempt count consumed (the worst chunk's attempts), or
    /// the count plus a reason when the attempt must fall back.
    async fn chunked_attempt(
        &self,
        request: &DownloadRequest,
        total: u64,
        part_path: &Path,
        progress: &Arc<ProgressTracker>,
    ) -> Result<u32, (u32, String)> {
        // Pre-size the output so each worker can write at its own offset.
        let presize = async {
            let file = File::create(part_path)
                .await
                .map_err(|e| DownloadError::io(part_path, e))?;
            file.set_len(total)
                .await
                .map_err(|e| DownloadError::io(part_path, e))?;
            Ok::<(), DownloadError>(())
        };
        if let Err(error) = presize.await {
            return Err((0, error.to_string()));
        }

        let plan = plan_chunks(total, self.config.chunk_size);
        info!(
            total_bytes = total,
            chunks = plan.len(),
            chunk_size = self.config.chunk_size,
            "starting chunked download"
        );

        let downloader = ChunkedDownloader::new(
            self.config.max_concurrent_chunks,
            self.config.retry.clone(),
        );
        let outcomes = downloader
            .download(
                &self.client,
                &request.url,
                &request.headers,
                &plan,
                part_path,
                progress,
            )
            .await;

        let attempts = outcomes.iter().map(|o| o.attempts).max().unwrap_or(0);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        if failed.is_empty() {
            info!(chunks = outcomes.len(), "all chunks complete");
            return Ok(attempts);
        }

        let first_error = failed
            .first()
            .and_then(|o| o.last_error.clone())
            .unwrap_or_else(|| "unknown chunk error".to_string());
        Err((
            attempts,
            format!(
                "{} of {} chunks failed; first error: {first_error}",
                failed.len(),
                outcomes.len()
            ),
        ))
    }

    /// Validates the staged artifact and atomically publishes it.
    async fn validate_and_publish(
        &self,
        request: &DownloadRequest,
        part_path: &Path,
        final_path: std::path::PathBuf,
        total_bytes: u64,
        attempts_used: u32,
    ) -> DownloadResult {
        debug!(path = %part_path.display(), "validating artifact");
        let valid = validate_media_file(
            part_path,
            &request.filename,
            request.expected_family,
            self.config.min_media_file_bytes,
        )
        .await;

        if !valid {
            warn!(path = %part_path.display(), "validation failed, deleting artifact");
            let _ = tokio::fs::remove_file(part_path).await;
            return DownloadResult::failed(
                final_path,
                attempts_used,
                "validation failed: artifact does not match a known media type",
            );
        }

        if let Err(error) = tokio::fs::rename(part_path, &final_path).await {
            let error = DownloadError::io(part_path, error);
            warn!(%error, "publish failed");
            let _ = tokio::fs::remove_file(part_path).await;
            return DownloadResult::failed(final_path, attempts_used, error.to_string());
        }

        info!(
            path = %final_path.display(),
            bytes = total_bytes,
            attempts = attempts_used,
            "download published"
        );
        DownloadResult::completed(final_path, total_bytes, attempts_used)
    }
}

async fn file_len(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|meta| meta.len())
}
