// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for lifecycle outcomes.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	issued: AtomicU64,
	validated: AtomicU64,
	rejected: AtomicU64,
	refreshed: AtomicU64,
	revoked: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the number of token pairs issued.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of access tokens accepted.
	pub fn validated(&self) -> u64 {
		self.validated.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens refused by validation or refresh.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Returns the number of access tokens minted from refresh tokens.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns the number of revocation entries written.
	pub fn revoked(&self) -> u64 {
		self.revoked.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_validated(&self) {
		self.validated.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejected(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refreshed(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revoked(&self) {
		self.revoked.fetch_add(1, Ordering::Relaxed);
	}
}
