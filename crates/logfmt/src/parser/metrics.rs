use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Error categories for metrics recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricErrorType {
    /// Line did not follow the key=value grammar
    Syntax,
    /// Line exceeded the configured max_line_size
    TooLarge,
}

/// Forces the wrapped counters onto their own cache line so threads sharing
/// one parser do not invalidate each other's groups.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Per-line counters (hottest path - updated per input line)
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub seen: AtomicU64,
    pub blank: AtomicU64,
    pub records: AtomicU64,
}

/// Per-call totals
#[derive(Debug, Default)]
pub struct TotalMetrics {
    pub calls: AtomicU64,
    pub failed_calls: AtomicU64,
    pub time_nanos: AtomicU64,
}

/// Error counters by type
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub syntax: AtomicU64,
    pub too_large: AtomicU64,
}

/// Counters for one parser instance (shared by all its clones).
///
/// All operations use `Ordering::Relaxed`; `snapshot()` reads are not
/// transactional across fields.
#[derive(Debug, Default)]
pub struct ParserMetrics {
    pub lines: CacheAligned<LineMetrics>,
    pub totals: CacheAligned<TotalMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl ParserMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines.0.seen.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_blank(&self) {
        self.lines.0.blank.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_records(&self, count: usize) {
        self.lines.0.records.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a finished parse call, successful or not
    #[inline]
    pub fn record_call(&self, time_nanos: u64, success: bool) {
        self.totals.0.calls.fetch_add(1, Ordering::Relaxed);
        self.totals.0.time_nanos.fetch_add(time_nanos, Ordering::Relaxed);
        if !success {
            self.totals.0.failed_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_error(&self, error_type: MetricErrorType) {
        match error_type {
            MetricErrorType::Syntax => self.errors.0.syntax.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::TooLarge => self.errors.0.too_large.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let calls = self.totals.0.calls.load(Ordering::Relaxed);
        let failed_calls = self.totals.0.failed_calls.load(Ordering::Relaxed);
        let time_nanos = self.totals.0.time_nanos.load(Ordering::Relaxed);

        MetricsSnapshot {
            lines_seen: self.lines.0.seen.load(Ordering::Relaxed),
            blank_lines: self.lines.0.blank.load(Ordering::Relaxed),
            records_produced: self.lines.0.records.load(Ordering::Relaxed),

            calls,
            failed_calls,
            avg_call_time_us: if calls > 0 {
                (time_nanos as f64 / calls as f64) / 1000.0
            } else {
                0.0
            },
            success_rate: if calls > 0 {
                (calls - failed_calls) as f64 / calls as f64
            } else {
                1.0
            },

            syntax_errors: self.errors.0.syntax.load(Ordering::Relaxed),
            lines_too_large: self.errors.0.too_large.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of parser metrics, cheap to clone and serializable
/// for logging.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    // Lines
    pub lines_seen: u64,
    pub blank_lines: u64,
    pub records_produced: u64,

    // Calls
    pub calls: u64,
    pub failed_calls: u64,
    pub avg_call_time_us: f64,
    pub success_rate: f64,

    // Errors
    pub syntax_errors: u64,
    pub lines_too_large: u64,
}
