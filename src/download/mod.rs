//! Media download engine with chunked transfers and content validation.
//!
//! The engine receives a [`DownloadRequest`] from the scraper boundary and
//! persists the remote object to `dest_dir/filename`:
//!
//! - a metadata-only probe determines size and advertised range support;
//! - large objects are fetched as concurrent byte-range chunks written at
//!   their own offsets in a pre-sized file, small or unknown-size objects
//!   in a single stream;
//! - a failed chunked attempt falls back to single-stream exactly once;
//! - the completed artifact must pass magic-number/extension validation
//!   before an atomic rename publishes it.
//!
//! # Example
//!
//! ```no_run
//! use media_downloader::{DownloadEngine, DownloadRequest, EngineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(EngineConfig::default())?;
//! let request = DownloadRequest::new(
//!     "https://example.com/media/photo.jpg",
//!     "photo.jpg",
//!     "./downloads",
//! );
//! let result = engine.download(&request).await;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

mod chunked;
mod client;
mod config;
mod constants;
mod engine;
mod error;
mod plan;
mod probe;
mod progress;
mod request;
mod retry;
mod single;
mod validate;

pub use chunked::ChunkOutcome;
pub use client::HttpClient;
pub use config::EngineConfig;
pub use constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENT_CHUNKS, MIN_MEDIA_FILE_BYTES};
pub use engine::{DownloadEngine, EngineError};
pub use error::DownloadError;
pub use plan::{ChunkPlan, ChunkSpec, plan_chunks};
pub use probe::{RemoteObjectInfo, probe_remote_object};
pub use request::{DownloadRequest, DownloadResult, MediaFamily};
pub use retry::{Backoff, DEFAULT_MAX_RETRIES, RetryPolicy};
pub use validate::validate_media_file;

// Note: no module-local Result aliases; function signatures spell out
// `Result<T, DownloadError>` explicitly.
