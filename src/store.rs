//! Key-value store contract shared by the revocation registry and the rate limiter, plus the
//! built-in backends.
//!
//! Every operation is a single atomic call against the backend, so an aborted request can leave
//! at most one extra increment behind and never a half-applied update.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;
pub mod resilient;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use self::redis::RedisStore;
pub use resilient::ResilientStore;

// self
use crate::{_prelude::*, config::StoreConfig, error::ConfigError};

/// Boxed future returned by every [`KvStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Networked key-value store offering atomic counters and expiring entries.
pub trait KvStore
where
	Self: Send + Sync,
{
	/// Atomically increments `key` and returns the new value.
	///
	/// When the increment creates the key (the result is `1`), the backend applies
	/// `ttl_if_created` in the same atomic step. Existing keys keep their expiry.
	fn increment<'a>(&'a self, key: &'a str, ttl_if_created: Duration) -> StoreFuture<'a, u64>;

	/// Stores `value` under `key`, replacing any previous value, expiring after `ttl`.
	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Fetches the value stored under `key`, if present and not expired.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Returns `true` if `key` is present and not expired.
	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

	/// Remaining lifetime of `key`; `None` when absent or without expiry.
	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>>;
}

/// Error type produced by [`KvStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// The backend refused or dropped the connection.
	#[error("Store is unreachable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
	/// The call did not complete within the configured bound.
	#[error("Store call `{operation}` timed out after {timeout_ms}ms.")]
	Timeout {
		/// Operation label.
		operation: &'static str,
		/// Configured bound in milliseconds.
		timeout_ms: u64,
	},
	/// Backend-level failure reported by the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Stored data could not be interpreted.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// The caller asked for an entry with a non-positive lifetime.
	#[error("Entry lifetime must be positive.")]
	NonPositiveTtl,
	/// The caller asked for an entry whose expiry cannot be represented.
	#[error("Entry lifetime is out of range.")]
	TtlOutOfRange,
}
impl StoreError {
	/// Returns `true` for connectivity failures that a single retry may cure.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Unavailable { .. } | Self::Timeout { .. } | Self::Backend { .. })
	}
}

/// Builds the store described by `config`, wrapped in a [`ResilientStore`].
///
/// Uses Redis when `redis_url` is set and falls back to a process-local [`MemoryStore`]
/// otherwise. A process-local store does not share counters or revocations across instances.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn KvStore>, ConfigError> {
	let inner: Arc<dyn KvStore> = match config.redis_url.as_deref() {
		#[cfg(feature = "redis")]
		Some(url) => Arc::new(RedisStore::connect(url).await?),
		#[cfg(not(feature = "redis"))]
		Some(_) =>
			return Err(ConfigError::StoreClient {
				message: "Redis support is not compiled in; enable the `redis` feature".into(),
			}),
		None => {
			#[cfg(feature = "tracing")]
			tracing::warn!("No Redis URL configured, using a process-local store.");

			Arc::new(MemoryStore::default())
		},
	};

	Ok(Arc::new(ResilientStore::from_config(inner, config)))
}

/// Converts a lifetime into whole milliseconds, rounding up so entries never expire early.
///
/// The result always fits in an `i64`.
pub(crate) fn ttl_millis(ttl: Duration) -> Result<u64, StoreError> {
	if !ttl.is_positive() {
		return Err(StoreError::NonPositiveTtl);
	}

	let millis = ttl.whole_milliseconds();
	let rounded = if ttl.subsec_nanoseconds() % 1_000_000 != 0 { millis + 1 } else { millis };

	i64::try_from(rounded)
		.ok()
		.and_then(|millis| u64::try_from(millis).ok())
		.ok_or(StoreError::TtlOutOfRange)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ttl_millis_rounds_up_and_rejects_non_positive() {
		assert_eq!(ttl_millis(Duration::seconds(61)), Ok(61_000));
		assert_eq!(ttl_millis(Duration::microseconds(1_500)), Ok(2));
		assert_eq!(ttl_millis(Duration::ZERO), Err(StoreError::NonPositiveTtl));
		assert_eq!(ttl_millis(Duration::seconds(-5)), Err(StoreError::NonPositiveTtl));
		assert_eq!(ttl_millis(Duration::MAX), Err(StoreError::TtlOutOfRange));
	}

	#[test]
	fn only_connectivity_errors_are_retryable() {
		assert!(StoreError::Unavailable { message: "refused".into() }.is_retryable());
		assert!(StoreError::Timeout { operation: "get", timeout_ms: 10 }.is_retryable());
		assert!(!StoreError::Serialization { message: "nan".into() }.is_retryable());
		assert!(!StoreError::NonPositiveTtl.is_retryable());
	}

	#[tokio::test]
	async fn connect_without_redis_url_uses_a_local_store() {
		let store = connect(&StoreConfig::default()).await.expect("Local store should build.");

		store
			.set_with_expiry("k", "v", Duration::seconds(5))
			.await
			.expect("Local store should accept writes.");

		assert_eq!(store.get("k").await, Ok(Some("v".into())));
	}
}
