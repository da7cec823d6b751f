//! Advisory transfer progress reporting.
//!
//! Progress is log output only; it is not part of the correctness contract.
//! A single tracker is shared by all chunk tasks of a transfer (or by the
//! one single-stream task) and rate-limits its own output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use super::constants::PROGRESS_LOG_INTERVAL;

/// Shared byte counter that periodically logs percentage and throughput.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    label: String,
    total: Option<u64>,
    interval: Duration,
    started: Instant,
    transferred: AtomicU64,
    last_log_ms: AtomicU64,
    last_log_bytes: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker for one transfer. `total` is the declared object
    /// size when known.
    pub(crate) fn new(label: impl Into<String>, total: Option<u64>) -> Self {
        Self {
            label: label.into(),
            total,
            interval: PROGRESS_LOG_INTERVAL,
            started: Instant::now(),
            transferred: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(0),
            last_log_bytes: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Total bytes recorded so far.
    pub(crate) fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Records `bytes` newly written and emits a log line if the reporting
    /// interval has elapsed. Safe to call from any worker task.
    pub(crate) fn record(&self, bytes: u64) {
        let transferred = self.transferred.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.maybe_log(transferred);
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn maybe_log(&self, transferred: u64) {
        let elapsed = self.started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let last_ms = self.last_log_ms.load(Ordering::Relaxed);
        if elapsed_ms.saturating_sub(last_ms) < self.interval.as_millis() as u64 {
            return;
        }
        // One worker wins the slot; the rest skip this interval.
        if self
            .last_log_ms
            .compare_exchange(last_ms, elapsed_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let last_bytes = self.last_log_bytes.swap(transferred, Ordering::Relaxed);
        let elapsed_secs = (elapsed_ms as f64 / 1000.0).max(1.0);
        let window_secs = ((elapsed_ms - last_ms) as f64 / 1000.0).max(1.0);
        let average_kbps = transferred as f64 / 1024.0 / elapsed_secs;
        let instant_kbps = transferred.saturating_sub(last_bytes) as f64 / 1024.0 / window_secs;

        if let Some(total) = self.total.filter(|t| *t > 0) {
            let percent = transferred * 100 / total;
            info!(
                file = %self.label,
                percent,
                average_kbps,
                instant_kbps,
                "download progress"
            );
        } else {
            info!(
                file = %self.label,
                transferred,
                average_kbps,
                "download progress"
            );
        }
    }
}
