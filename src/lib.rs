//! Media Download Engine
//!
//! This library persists remote media artifacts (images, videos) discovered
//! by site-specific scrapers to local storage. Scrapers hand the engine a
//! [`DownloadRequest`] (URL, target filename, destination directory, headers)
//! and receive a [`DownloadResult`] once the artifact has been transferred,
//! validated, and atomically published.
//!
//! # Architecture
//!
//! The library is organized around the [`download`] module:
//! - `probe` - metadata-only size/range probe against the origin
//! - `plan` - partitioning a known size into disjoint byte ranges
//! - `chunked` - concurrent byte-range transfer with a bounded worker pool
//! - `single` - sequential streaming transfer with temp-file staging
//! - `validate` - magic-number/extension validation of completed artifacts
//! - `engine` - strategy selection, fallback, and atomic publish

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
mod user_agent;

// Re-export commonly used types
pub use download::{
    ChunkOutcome, ChunkPlan, ChunkSpec, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENT_CHUNKS,
    DEFAULT_MAX_RETRIES, Backoff, DownloadEngine, DownloadError, DownloadRequest, DownloadResult,
    EngineConfig, EngineError, HttpClient, MediaFamily, RemoteObjectInfo, RetryPolicy,
    plan_chunks, probe_remote_object, validate_media_file,
};
