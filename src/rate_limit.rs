//! Fixed-window request throttling backed by the shared store.
//!
//! Each `(client key, window)` pair owns one counter at `ratelimit:<client_key>:<window_id>`,
//! where `window_id = floor(unix_seconds / window_seconds)`. The counter is incremented before
//! it is compared with the limit, so denied requests still count. A burst straddling a window
//! boundary can pass up to twice the limit.

// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, id::validate_view},
	clock::Clock,
	config::{FailurePolicy, MAX_WINDOW_SECS, RateLimitConfig},
	error::ConfigError,
	obs::{self, OpKind, OpOutcome, OpSpan, ThrottleVerdict},
	store::KvStore,
};

const KEY_PREFIX: &str = "ratelimit:";

/// Identity a request budget is tracked under, typically `<ip>:<endpoint class>`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);
impl ClientKey {
	/// Validates an arbitrary caller-supplied key (non-empty, no whitespace).
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view("ClientKey", view)?;

		Ok(Self(view.to_owned()))
	}

	/// Builds the conventional `<ip>:<endpoint class>` key.
	pub fn for_endpoint(ip: IpAddr, class: &str) -> Result<Self, IdentifierError> {
		Self::new(format!("{ip}:{class}"))
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ClientKey({})", self.0)
	}
}
impl Display for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Result of a single throttling check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
	/// Whether the request may proceed.
	pub allowed: bool,
	/// Counter value after this request; zero when the store was skipped.
	pub count: u64,
	/// Requests allowed per window.
	pub limit: u64,
	/// Requests left in the current window.
	pub remaining: u64,
	/// Window length in seconds.
	pub window_seconds: u64,
	/// Instant at which the current window ends.
	pub reset_at: OffsetDateTime,
}
impl RateLimitDecision {
	/// Converts a denial into [`Error::RateLimitExceeded`].
	pub fn into_result(self) -> Result<Self> {
		if self.allowed {
			Ok(self)
		} else {
			Err(Error::RateLimitExceeded { limit: self.limit, window_seconds: self.window_seconds })
		}
	}
}

/// Store-backed fixed-window rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
	store: Arc<dyn KvStore>,
	clock: Arc<dyn Clock>,
	default_limit: u64,
	default_window: Duration,
	slack: Duration,
	failure_policy: FailurePolicy,
}
impl RateLimiter {
	/// Builds a limiter whose default policy and failure behaviour come from `config`.
	pub fn from_config(
		config: &RateLimitConfig,
		store: Arc<dyn KvStore>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			store,
			clock,
			default_limit: config.limit,
			default_window: Duration::seconds(i64::try_from(config.window_secs).unwrap_or(i64::MAX)),
			slack: Duration::seconds(i64::try_from(config.slack_secs).unwrap_or(i64::MAX)),
			failure_policy: config.failure_policy,
		}
	}

	/// Overrides the behaviour used when the store is unavailable.
	pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.failure_policy = policy;

		self
	}

	/// Counts one request for `client_key` and reports whether it fits in `limit` per `window`.
	pub async fn allow(&self, client_key: &ClientKey, limit: u64, window: Duration) -> Result<bool> {
		self.check(client_key, limit, window).await.map(|decision| decision.allowed)
	}

	/// [`RateLimiter::allow`] with the configured default limit and window.
	pub async fn allow_default(&self, client_key: &ClientKey) -> Result<bool> {
		self.allow(client_key, self.default_limit, self.default_window).await
	}

	/// [`RateLimiter::check`] with the configured default limit and window.
	pub async fn check_default(&self, client_key: &ClientKey) -> Result<RateLimitDecision> {
		self.check(client_key, self.default_limit, self.default_window).await
	}

	/// Counts one request and returns the full decision.
	///
	/// Store failures follow the configured [`FailurePolicy`]: `FailOpen` allows the request,
	/// `FailClosed` returns [`Error::StoreUnavailable`].
	pub async fn check(
		&self,
		client_key: &ClientKey,
		limit: u64,
		window: Duration,
	) -> Result<RateLimitDecision> {
		let span = OpSpan::new(OpKind::RateLimit, "check");

		obs::record_op_outcome(OpKind::RateLimit, OpOutcome::Attempt);

		let result = span.instrument(self.check_inner(client_key, limit, window)).await;
		let outcome = match &result {
			Ok(decision) if !decision.allowed => OpOutcome::Rejected,
			other => OpOutcome::of(other),
		};

		span.record_outcome(outcome);
		obs::record_op_outcome(OpKind::RateLimit, outcome);

		result
	}

	async fn check_inner(
		&self,
		client_key: &ClientKey,
		limit: u64,
		window: Duration,
	) -> Result<RateLimitDecision> {
		let window_seconds = window.whole_seconds();

		if window_seconds <= 0 {
			return Err(ConfigError::NonPositive { field: "rate_limit.window" }.into());
		}
		if window_seconds > MAX_WINDOW_SECS {
			return Err(
				ConfigError::OutOfRange { field: "rate_limit.window", max: MAX_WINDOW_SECS }.into()
			);
		}

		let counter_ttl = window
			.checked_add(self.slack)
			.ok_or(ConfigError::OutOfRange { field: "rate_limit.slack", max: MAX_WINDOW_SECS })?;
		let now = self.clock.now();
		let unix = now.unix_timestamp();
		let window_id = unix.div_euclid(window_seconds);
		let reset_at = (window_id + 1)
			.checked_mul(window_seconds)
			.and_then(|end| now.checked_add(Duration::seconds(end - unix)))
			.ok_or(ConfigError::OutOfRange { field: "rate_limit.window", max: MAX_WINDOW_SECS })?;
		let window_seconds = window_seconds.unsigned_abs();
		let key = window_key(client_key, window_id);

		match self.store.increment(&key, counter_ttl).await {
			Ok(count) => {
				let allowed = count <= limit;

				obs::record_throttle_verdict(if allowed {
					ThrottleVerdict::Allowed
				} else {
					ThrottleVerdict::Denied
				});

				#[cfg(feature = "tracing")]
				if !allowed {
					tracing::debug!(client_key = %client_key, count, limit, "Rate limit exceeded.");
				}

				Ok(RateLimitDecision {
					allowed,
					count,
					limit,
					remaining: limit.saturating_sub(count),
					window_seconds,
					reset_at,
				})
			},
			Err(e) => match self.failure_policy {
				FailurePolicy::FailOpen => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						client_key = %client_key,
						error = %e,
						"Rate limit store unavailable, allowing request."
					);
					#[cfg(not(feature = "tracing"))]
					let _ = e;

					obs::record_throttle_verdict(ThrottleVerdict::FailOpen);

					Ok(RateLimitDecision {
						allowed: true,
						count: 0,
						limit,
						remaining: limit,
						window_seconds,
						reset_at,
					})
				},
				FailurePolicy::FailClosed => Err(e.into()),
			},
		}
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("default_limit", &self.default_limit)
			.field("default_window", &self.default_window)
			.field("slack", &self.slack)
			.field("failure_policy", &self.failure_policy)
			.finish()
	}
}

/// Store key of the counter for `client_key` in window `window_id`.
pub fn window_key(client_key: &ClientKey, window_id: i64) -> String {
	format!("{KEY_PREFIX}{}:{window_id}", client_key.as_str())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{clock::ManualClock, store::MemoryStore};

	fn limiter(policy: FailurePolicy) -> (RateLimiter, Arc<MemoryStore>, Arc<ManualClock>) {
		// 1_735_689_600 is a multiple of 60, so the clock starts on a window boundary.
		let clock = Arc::new(ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC)));
		let store = Arc::new(MemoryStore::new(clock.clone()));
		let config = RateLimitConfig { limit: 3, failure_policy: policy, ..Default::default() };

		(RateLimiter::from_config(&config, store.clone(), clock.clone()), store, clock)
	}

	fn key() -> ClientKey {
		ClientKey::for_endpoint("10.0.0.1".parse().expect("IP fixture should parse."), "login")
			.expect("Client key fixture should be valid.")
	}

	#[test]
	fn client_keys_reject_whitespace() {
		assert_eq!(key().as_str(), "10.0.0.1:login");
		assert!(ClientKey::new("10.0.0.1 login").is_err());
		assert!(ClientKey::new("").is_err());
	}

	#[tokio::test]
	async fn counter_key_and_expiry_follow_the_window() {
		let (limiter, store, _) = limiter(FailurePolicy::FailOpen);
		let decision = limiter.check_default(&key()).await.expect("Check should succeed.");

		assert_eq!(decision, RateLimitDecision {
			allowed: true,
			count: 1,
			limit: 3,
			remaining: 2,
			window_seconds: 60,
			reset_at: macros::datetime!(2025-01-01 00:01 UTC),
		});
		assert_eq!(
			store.ttl("ratelimit:10.0.0.1:login:28928160").await,
			Ok(Some(Duration::seconds(61)))
		);
	}

	#[tokio::test]
	async fn requests_past_the_limit_are_denied_until_the_next_window() {
		let (limiter, _, clock) = limiter(FailurePolicy::FailOpen);
		let key = key();

		for _ in 0..3 {
			assert_eq!(limiter.allow_default(&key).await.ok(), Some(true));
		}

		let denied = limiter.check_default(&key).await.expect("Check should succeed.");

		assert!(!denied.allowed);
		assert_eq!(denied.count, 4);
		assert_eq!(denied.remaining, 0);
		assert!(matches!(
			denied.into_result(),
			Err(Error::RateLimitExceeded { limit: 3, window_seconds: 60 })
		));

		clock.advance(Duration::seconds(60));

		assert_eq!(limiter.allow_default(&key).await.ok(), Some(true));
	}

	#[tokio::test]
	async fn zero_limit_denies_everything() {
		let (limiter, _, _) = limiter(FailurePolicy::FailOpen);

		assert_eq!(limiter.allow(&key(), 0, Duration::seconds(10)).await.ok(), Some(false));
	}

	#[tokio::test]
	async fn sub_second_windows_are_rejected() {
		let (limiter, _, _) = limiter(FailurePolicy::FailOpen);

		assert!(matches!(
			limiter.allow(&key(), 5, Duration::milliseconds(500)).await,
			Err(Error::Config(ConfigError::NonPositive { .. }))
		));
	}

	#[tokio::test]
	async fn oversized_windows_and_slack_are_rejected() {
		let (limiter, store, clock) = limiter(FailurePolicy::FailOpen);

		assert!(matches!(
			limiter.allow(&key(), 5, Duration::seconds(1_000_000_000_000)).await,
			Err(Error::Config(ConfigError::OutOfRange { field: "rate_limit.window", .. }))
		));

		let config = RateLimitConfig { slack_secs: u64::MAX, ..Default::default() };
		let limiter = RateLimiter::from_config(&config, store.clone(), clock);

		assert!(matches!(
			limiter.allow(&key(), 5, Duration::seconds(60)).await,
			Err(Error::Config(ConfigError::OutOfRange { field: "rate_limit.slack", .. }))
		));
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn store_failure_follows_the_policy() {
		let (open, store, _) = limiter(FailurePolicy::FailOpen);

		store.simulate_outage(true);

		let decision = open.check_default(&key()).await.expect("Fail-open should allow.");

		assert!(decision.allowed);
		assert_eq!(decision.count, 0);

		let closed = open.with_failure_policy(FailurePolicy::FailClosed);

		assert!(matches!(closed.allow_default(&key()).await, Err(Error::StoreUnavailable(_))));
	}
}
