//! HTTP client wrapper for download traffic.
//!
//! Thin layer over `reqwest` that applies the engine's fixed timeouts, the
//! default User-Agent, and the per-request header set uniformly to every
//! request issued by every downloader path. Status handling stays with the
//! callers: the probe degrades softly, the single-stream path accepts any
//! success status, and chunk tasks insist on 206.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use reqwest::{Client, Response};
use tracing::debug;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent::DEFAULT_USER_AGENT;

/// HTTP client for media downloads with streaming support.
///
/// Created once per engine and reused for every request, taking advantage
/// of connection pooling across probe, chunk, and single-stream traffic.
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
    /// Creates a client with the default timeouts (20s connect, 120s read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .gzip(true)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues a HEAD request with the given headers.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for transport failures (network, timeout)
    /// or unencodable headers. Status codes are not interpreted here.
    pub(crate) async fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Response, DownloadError> {
        let header_map = build_header_map(headers)?;
        debug!(url, "sending HEAD request");
        self.client
            .head(url)
            .headers(header_map)
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))
    }

    /// Issues a GET request with the given headers and optional `Range`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for transport failures (network, timeout)
    /// or unencodable headers. Status codes are not interpreted here.
    pub(crate) async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        range: Option<&str>,
    ) -> Result<Response, DownloadError> {
        let header_map = build_header_map(headers)?;
        let mut request = self.client.get(url).headers(header_map);
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }
        request
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Converts plain key/value pairs into a header map.
///
/// Headers arrive from the scraper boundary as strings; names or values
/// that cannot be encoded fail the request rather than being dropped
/// silently.
fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap, DownloadError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DownloadError::invalid_header(name))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| DownloadError::invalid_header(name))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

/// Maps a reqwest transport error onto the download error taxonomy.
fn map_transport_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else {
        DownloadError::network(url, error)
    }
}
