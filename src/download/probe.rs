//! Metadata-only probe for remote object size and range support.
//!
//! The probe fails soft: any network or protocol problem degrades to
//! "size unknown", which forces the engine onto the single-stream path.
//! No body bytes are transferred.

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH};
use tracing::{debug, instrument};

use super::client::HttpClient;

/// What the origin declared about the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteObjectInfo {
    /// Declared size in bytes; `None` when the origin did not say or the
    /// probe failed.
    pub total_size: Option<u64>,
    /// Whether the origin advertised `Accept-Ranges: bytes`. Advisory:
    /// absence does not prove ranges are unsupported.
    pub accepts_ranges: bool,
}

impl RemoteObjectInfo {
    /// Info for an object whose size could not be determined.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            total_size: None,
            accepts_ranges: false,
        }
    }
}

/// Issues a HEAD request and reads the declared content length.
///
/// Never fails: errors and non-success statuses yield
/// [`RemoteObjectInfo::unknown`].
#[instrument(skip(client, headers), fields(url = %url))]
pub async fn probe_remote_object(
    client: &HttpClient,
    url: &str,
    headers: &[(String, String)],
) -> RemoteObjectInfo {
    let response = match client.head(url, headers).await {
        Ok(response) => response,
        Err(error) => {
            debug!(%error, "size probe failed, treating size as unknown");
            return RemoteObjectInfo::unknown();
        }
    };

    if !response.status().is_success() {
        debug!(
            status = response.status().as_u16(),
            "size probe got error status, treating size as unknown"
        );
        return RemoteObjectInfo::unknown();
    }

    let total_size = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let accepts_ranges = response
        .headers()
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));

    debug!(?total_size, accepts_ranges, "size probe complete");

    RemoteObjectInfo {
        total_size,
        accepts_ranges,
    }
}
