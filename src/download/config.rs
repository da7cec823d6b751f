//! Engine configuration.
//!
//! All tunables are an explicit value handed to the engine at construction,
//! never ambient process-wide state, so tests can vary them per case
//! without cross-test interference.

use std::time::Duration;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENT_CHUNKS, MIN_MEDIA_FILE_BYTES,
    READ_TIMEOUT_SECS,
};
use super::retry::RetryPolicy;

/// Tunables for a [`DownloadEngine`](super::DownloadEngine).
///
/// The retry policy is shared by both downloader paths; the timeouts are
/// applied uniformly to every request the engine issues.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Size of each byte-range chunk.
    pub chunk_size: u64,
    /// Objects smaller than this (or of unknown size) are downloaded in a
    /// single stream. Defaults to `chunk_size`.
    pub chunk_threshold: u64,
    /// Maximum number of chunks downloading at once.
    pub max_concurrent_chunks: usize,
    /// Retry policy for both downloader paths.
    pub retry: RetryPolicy,
    /// HTTP connect timeout for every request.
    pub connect_timeout: Duration,
    /// HTTP read timeout for every request.
    pub read_timeout: Duration,
    /// Smallest completed file that passes validation.
    pub min_media_file_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_threshold: DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: DEFAULT_CONCURRENT_CHUNKS,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            min_media_file_bytes: MIN_MEDIA_FILE_BYTES,
        }
    }
}
