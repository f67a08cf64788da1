//! Timeout and single-retry wrapper applied at the store boundary.

// self
use crate::{
	_prelude::*,
	config::StoreConfig,
	store::{KvStore, StoreError, StoreFuture},
};

/// Decorates any [`KvStore`] with a per-call timeout and one retry after a short backoff.
///
/// Only connectivity failures ([`StoreError::is_retryable`]) are retried. The second failure is
/// returned unchanged so callers can map it to `StoreUnavailable`.
#[derive(Clone)]
pub struct ResilientStore {
	inner: Arc<dyn KvStore>,
	timeout: std::time::Duration,
	backoff: std::time::Duration,
}
impl ResilientStore {
	/// Wraps `inner` with the provided bounds.
	pub fn new(
		inner: Arc<dyn KvStore>,
		timeout: std::time::Duration,
		backoff: std::time::Duration,
	) -> Self {
		Self { inner, timeout, backoff }
	}

	/// Wraps `inner` with the bounds from [`StoreConfig`].
	pub fn from_config(inner: Arc<dyn KvStore>, config: &StoreConfig) -> Self {
		Self::new(inner, config.timeout(), config.retry_backoff())
	}

	async fn run<'a, T, F>(&'a self, operation: &'static str, mut call: F) -> Result<T, StoreError>
	where
		F: FnMut() -> StoreFuture<'a, T>,
	{
		match self.attempt(operation, call()).await {
			Err(e) if e.is_retryable() => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					operation,
					error = %e,
					backoff_ms = self.backoff.as_millis() as u64,
					"Store call failed, retrying once."
				);

				tokio::time::sleep(self.backoff).await;

				let retried = self.attempt(operation, call()).await;

				#[cfg(feature = "tracing")]
				if let Err(e) = &retried {
					tracing::warn!(operation, error = %e, "Store call failed after retry.");
				}

				retried
			},
			outcome => outcome,
		}
	}

	async fn attempt<T>(
		&self,
		operation: &'static str,
		call: StoreFuture<'_, T>,
	) -> Result<T, StoreError> {
		match tokio::time::timeout(self.timeout, call).await {
			Ok(outcome) => outcome,
			Err(_) => Err(StoreError::Timeout {
				operation,
				timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
			}),
		}
	}
}
impl Debug for ResilientStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResilientStore")
			.field("timeout", &self.timeout)
			.field("backoff", &self.backoff)
			.finish()
	}
}
impl KvStore for ResilientStore {
	fn increment<'a>(&'a self, key: &'a str, ttl_if_created: Duration) -> StoreFuture<'a, u64> {
		Box::pin(self.run("increment", move || self.inner.increment(key, ttl_if_created)))
	}

	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(self.run("set_with_expiry", move || self.inner.set_with_expiry(key, value, ttl)))
	}

	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(self.run("get", move || self.inner.get(key)))
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(self.run("exists", move || self.inner.exists(key)))
	}

	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
		Box::pin(self.run("ttl", move || self.inner.ttl(key)))
	}
}
