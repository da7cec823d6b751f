//! Shared User-Agent string for engine HTTP traffic.

/// Browser-like User-Agent applied when a request supplies none.
///
/// Media CDNs commonly reject non-browser agents, so the fallback mimics the
/// desktop browser the upstream scrapers emulate. Requests that carry their
/// own `User-Agent` header override this on a per-request basis.
pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
