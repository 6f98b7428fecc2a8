// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing refresh gate activity.
///
/// One attempt is recorded per wave, not per queued request; the gap between
/// `attempts` and `coalesced_waiters` is exactly the deduplication the gate
/// provides.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	coalesced: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how many refresh waves have been opened.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns how many waves settled with a fresh token.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns how many waves settled with a rejection.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns how many callers joined a wave that was already in flight.
	pub fn coalesced_waiters(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}
}
