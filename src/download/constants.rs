//! Constants for the download module (timeouts, chunking, validation).

use std::time::Duration;

/// Default HTTP connect timeout (20 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 20;

/// Default HTTP read timeout (2 minutes, sized for large media files).
pub const READ_TIMEOUT_SECS: u64 = 120;

/// Default chunk size for byte-range downloads (5 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of concurrently downloading chunks.
pub const DEFAULT_CONCURRENT_CHUNKS: usize = 3;

/// Smallest file size accepted by media validation.
///
/// Anything below this is an error page or truncated response saved under
/// the target filename, not a real media artifact.
pub const MIN_MEDIA_FILE_BYTES: u64 = 100;

/// Suffix appended to the target filename while a download is in progress.
pub const PART_FILE_SUFFIX: &str = ".part";

/// Minimum interval between advisory progress log lines.
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(15);
