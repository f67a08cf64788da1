//! Configuration for token lifetimes, signing, throttling, and store access.
//!
//! Values are layered with `figment`: built-in defaults, then an optional TOML file, then
//! `SESSION_GUARD_*` environment variables (nested keys separated by `__`, e.g.
//! `SESSION_GUARD_RATE_LIMIT__LIMIT=50`). Call [`AuthConfig::validate`] once at startup; a
//! missing or weak signing secret is the only fatal condition in the crate.

// std
use std::path::Path;
// crates.io
use figment::{
	Figment,
	providers::{Env, Format, Serialized, Toml},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Minimum HS256 key length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (ten years) in seconds.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 366 * 24 * 60 * 60;
/// Longest accepted rate-limit window or counter slack (one year) in seconds.
pub const MAX_WINDOW_SECS: i64 = 366 * 24 * 60 * 60;

const ENV_PREFIX: &str = "SESSION_GUARD_";

/// Behaviour when the shared store cannot answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
	/// Permit the request.
	FailOpen,
	/// Reject the request.
	FailClosed,
}

/// HMAC signing secret; redacted in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningSecret(String);
impl SigningSecret {
	/// Wraps a secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw secret bytes.
	pub fn expose(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Checks presence and minimum length.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.0.len() {
			0 => Err(ConfigError::MissingSigningSecret),
			actual if actual < MIN_SECRET_LEN =>
				Err(ConfigError::WeakSigningSecret { min: MIN_SECRET_LEN, actual }),
			_ => Ok(()),
		}
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}

/// Fixed-window throttling parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
	/// Requests allowed per window.
	pub limit: u64,
	/// Window length in seconds.
	pub window_secs: u64,
	/// Extra counter lifetime so a counter never expires before its window ends.
	pub slack_secs: u64,
	/// Decision taken when the store is unavailable.
	pub failure_policy: FailurePolicy,
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self { limit: 1_000, window_secs: 60, slack_secs: 1, failure_policy: FailurePolicy::FailOpen }
	}
}

/// Store connection and resilience parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	/// Redis connection URL; `None` means the caller supplies its own store.
	pub redis_url: Option<String>,
	/// Upper bound for a single store call.
	pub timeout_ms: u64,
	/// Pause before the single retry of a failed store call.
	pub retry_backoff_ms: u64,
}
impl StoreConfig {
	/// Per-call timeout as a std duration.
	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.timeout_ms)
	}

	/// Retry backoff as a std duration.
	pub fn retry_backoff(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.retry_backoff_ms)
	}
}
impl Default for StoreConfig {
	fn default() -> Self {
		Self { redis_url: None, timeout_ms: 250, retry_backoff_ms: 50 }
	}
}

/// Top-level configuration consumed by [`TokenManager`](crate::lifecycle::TokenManager) and
/// [`RateLimiter`](crate::rate_limit::RateLimiter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
	/// HS256 signing secret.
	pub signing_secret: SigningSecret,
	/// Access token lifetime in seconds.
	pub access_ttl_secs: i64,
	/// Refresh token lifetime in seconds.
	pub refresh_ttl_secs: i64,
	/// Decision taken when the revocation registry cannot be consulted.
	pub revocation_failure_policy: FailurePolicy,
	/// Throttling parameters.
	pub rate_limit: RateLimitConfig,
	/// Store parameters.
	pub store: StoreConfig,
}
impl AuthConfig {
	/// Creates a configuration with default lifetimes and the provided secret.
	pub fn new(secret: impl Into<String>) -> Self {
		Self { signing_secret: SigningSecret::new(secret), ..Default::default() }
	}

	/// Loads defaults, then `path` (if any), then `SESSION_GUARD_*` environment variables.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut figment = Figment::from(Serialized::defaults(Self::default()));

		if let Some(path) = path {
			figment = figment.merge(Toml::file(path));
		}

		Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
	}

	/// Extracts and validates a configuration from a caller-assembled figment.
	pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
		let config: Self = figment.extract()?;

		config.validate()?;

		Ok(config)
	}

	/// Checks the secret and every duration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.signing_secret.validate()?;

		for (field, secs) in
			[("access_ttl_secs", self.access_ttl_secs), ("refresh_ttl_secs", self.refresh_ttl_secs)]
		{
			if secs <= 0 {
				return Err(ConfigError::NonPositive { field });
			}
			if secs > MAX_TOKEN_TTL_SECS {
				return Err(ConfigError::OutOfRange { field, max: MAX_TOKEN_TTL_SECS });
			}
		}

		if self.rate_limit.window_secs == 0 {
			return Err(ConfigError::NonPositive { field: "rate_limit.window_secs" });
		}

		for (field, secs) in [
			("rate_limit.window_secs", self.rate_limit.window_secs),
			("rate_limit.slack_secs", self.rate_limit.slack_secs),
		] {
			if secs > MAX_WINDOW_SECS.unsigned_abs() {
				return Err(ConfigError::OutOfRange { field, max: MAX_WINDOW_SECS });
			}
		}

		if self.store.timeout_ms == 0 {
			return Err(ConfigError::NonPositive { field: "store.timeout_ms" });
		}

		Ok(())
	}

	/// Access token lifetime.
	pub fn access_ttl(&self) -> Duration {
		Duration::seconds(self.access_ttl_secs)
	}

	/// Refresh token lifetime.
	pub fn refresh_ttl(&self) -> Duration {
		Duration::seconds(self.refresh_ttl_secs)
	}

	/// Overrides the access token lifetime.
	pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
		self.access_ttl_secs = ttl.whole_seconds();

		self
	}

	/// Overrides the refresh token lifetime.
	pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
		self.refresh_ttl_secs = ttl.whole_seconds();

		self
	}

	/// Overrides the revocation failure policy.
	pub fn with_revocation_failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.revocation_failure_policy = policy;

		self
	}

	/// Overrides the throttling parameters.
	pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
		self.rate_limit = rate_limit;

		self
	}
}
impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			signing_secret: SigningSecret::default(),
			access_ttl_secs: 60 * 60,
			refresh_ttl_secs: 30 * 24 * 60 * 60,
			revocation_failure_policy: FailurePolicy::FailClosed,
			rate_limit: RateLimitConfig::default(),
			store: StoreConfig::default(),
		}
	}
}
