//! Error types for the download module.
//!
//! This module defines structured errors for all download operations,
//! providing context-rich error messages for debugging and log output.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during media downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The origin answered a byte-range request with something other than
    /// 206 Partial Content.
    ///
    /// A 200 here means the origin ignored the `Range` header; accepting the
    /// full body would write the whole object into a sub-range of the output
    /// file, so the chunk task fails without reading the body.
    #[error("range request rejected with HTTP {status} for {url}")]
    RangeNotSupported {
        /// The URL that rejected the range request.
        url: String,
        /// The HTTP status code that was returned instead of 206.
        status: u16,
    },

    /// Transferred byte count differs from the expected length.
    #[error("length mismatch for {url}: expected {expected_bytes} bytes, got {actual_bytes}")]
    LengthMismatch {
        /// The URL whose transfer was incomplete or oversized.
        url: String,
        /// Expected size in bytes.
        expected_bytes: u64,
        /// Actual size in bytes.
        actual_bytes: u64,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A request header could not be encoded.
    #[error("invalid request header: {name}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a rejected-range error.
    pub fn range_not_supported(url: impl Into<String>, status: u16) -> Self {
        Self::RangeNotSupported {
            url: url.into(),
            status,
        }
    }

    /// Creates a length mismatch error.
    pub fn length_mismatch(
        url: impl Into<String>,
        expected_bytes: u64,
        actual_bytes: u64,
    ) -> Self {
        Self::LengthMismatch {
            url: url.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or `From<std::io::Error>`
// because our error variants require context (url, path) that the source errors
// don't provide. The helper constructor methods (network(), io(), etc.) are the
// correct pattern here as they allow callers to provide necessary context.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let error = DownloadError::timeout("https://example.com/clip.mp4");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/clip.mp4"));
    }

    #[test]
    fn test_http_status_display() {
        let error = DownloadError::http_status("https://example.com/photo.jpg", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/photo.jpg"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_range_not_supported_display() {
        let error = DownloadError::range_not_supported("https://example.com/clip.mp4", 200);
        let msg = error.to_string();
        assert!(msg.contains("range request rejected"), "got: {msg}");
        assert!(msg.contains("200"), "Expected status in: {msg}");
    }

    #[test]
    fn test_length_mismatch_display() {
        let error = DownloadError::length_mismatch("https://example.com/clip.mp4", 5000, 4096);
        let msg = error.to_string();
        assert!(msg.contains("5000"), "Expected expected bytes in: {msg}");
        assert!(msg.contains("4096"), "Expected actual bytes in: {msg}");
    }

    #[test]
    fn test_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/photo.jpg"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/photo.jpg"), "Expected path in: {msg}");
    }

    #[test]
    fn test_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_invalid_header_display() {
        let error = DownloadError::invalid_header("Ref\nerer");
        assert!(error.to_string().contains("invalid request header"));
    }
}
