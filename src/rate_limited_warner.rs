use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How often repeated warnings of one kind are emitted.
pub(crate) const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

const NEVER: u64 = u64::MAX;

/// Helper that coalesces repeated warnings.
///
/// The caller counts each occurrence via [`record`](Self::record). The next
/// call to [`warn_if_due`](Self::warn_if_due) emits one warning covering every
/// occurrence since the last emission, provided the interval has elapsed. The
/// first warning is emitted immediately. [`flush`](Self::flush) emits any
/// pending count regardless of the interval.
pub(crate) struct RateLimitedWarner {
    origin: Instant,
    interval_ms: u64,
    last_warn_ms: AtomicU64,
    pending: AtomicU64,
}

impl RateLimitedWarner {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_warn_ms: AtomicU64::new(NEVER),
            pending: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX - 1)
    }

    /// Count one occurrence.
    pub(crate) fn record(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit a warning if the interval has elapsed since the last one.
    pub(crate) fn warn_if_due(&self, warn: impl FnOnce(u64)) {
        let now = self.now_ms();
        let prev = self.last_warn_ms.load(Ordering::Relaxed);
        if prev != NEVER && now.saturating_sub(prev) < self.interval_ms {
            return;
        }
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn_ms.store(now, Ordering::Relaxed);
        }
    }

    /// Count one occurrence and warn if due.
    pub(crate) fn record_and_warn(&self, warn: impl FnOnce(u64)) {
        self.record();
        self.warn_if_due(warn);
    }

    /// Immediately warn about any pending occurrences.
    pub(crate) fn flush(&self, warn: impl FnOnce(u64)) {
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn_ms.store(self.now_ms(), Ordering::Relaxed);
        }
    }
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}
