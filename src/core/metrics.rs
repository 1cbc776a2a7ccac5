//! Logger metrics for observability
//!
//! Counters for records written, sink failures, internal failures and
//! entries that were gated off by the level threshold.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use zlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written(12);
/// metrics.record_gated();
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.bytes_written(), 12);
/// assert_eq!(metrics.entries_gated(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records handed to a sink in full
    records_written: AtomicU64,

    /// Payload bytes of those records
    bytes_written: AtomicU64,

    /// Writes or flushes that failed at the sink
    write_failures: AtomicU64,

    /// Failures routed through the internal failure policy
    internal_failures: AtomicU64,

    /// Entries created below the level threshold
    entries_gated: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            internal_failures: AtomicU64::new(0),
            entries_gated: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn internal_failures(&self) -> u64 {
        self.internal_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_gated(&self) -> u64 {
        self.entries_gated.load(Ordering::Relaxed)
    }

    /// Record a record of `bytes` bytes written to a sink
    #[inline]
    pub fn record_written(&self, bytes: usize) -> u64 {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_internal_failure(&self) -> u64 {
        self.internal_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_gated(&self) -> u64 {
        self.entries_gated.fetch_add(1, Ordering::Relaxed)
    }

    /// Get write failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.records_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_written.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.internal_failures.store(0, Ordering::Relaxed);
        self.entries_gated.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_written: AtomicU64::new(self.records_written()),
            bytes_written: AtomicU64::new(self.bytes_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            internal_failures: AtomicU64::new(self.internal_failures()),
            entries_gated: AtomicU64::new(self.entries_gated()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.records_written(), 0);
        assert_eq!(metrics.bytes_written(), 0);
        assert_eq!(metrics.write_failures(), 0);
        assert_eq!(metrics.internal_failures(), 0);
        assert_eq!(metrics.entries_gated(), 0);
    }

    #[test]
    fn test_record_written_counts_bytes() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_written(10), 0); // Returns previous value
        metrics.record_written(5);
        assert_eq!(metrics.records_written(), 2);
        assert_eq!(metrics.bytes_written(), 15);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..3 {
            metrics.record_written(1);
        }
        metrics.record_write_failure();
        assert_eq!(metrics.failure_rate(), 25.0);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_internal_failure();
        metrics.record_gated();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.internal_failures(), 0);
        assert_eq!(metrics.entries_gated(), 0);
        assert_eq!(snapshot.internal_failures(), 1);
        assert_eq!(snapshot.entries_gated(), 1);
    }
}
