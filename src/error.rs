//! Crate-level error types shared by the codec, registry, limiter, and lifecycle manager.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Token rejections are terminal for the current request and never retried; store failures
/// have already been retried once at the store boundary before they surface here.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token is structurally invalid (segments, encoding, JSON, missing fields, algorithm).
	#[error("Token is malformed: {reason}.")]
	Malformed {
		/// Human-readable parsing failure; never shown to end users.
		reason: String,
	},
	/// Token signature does not match its contents.
	#[error("Token signature is invalid.")]
	SignatureInvalid,
	/// Token expiry instant has passed.
	#[error("Token has expired.")]
	Expired,
	/// Token has the wrong type for the requested operation.
	#[error("Expected {expected} token but found {found}.")]
	WrongTokenType {
		/// Token type required by the operation.
		expected: &'static str,
		/// Token type carried by the presented token.
		found: &'static str,
	},
	/// Token has been revoked and must not be reused.
	#[error("Token has been revoked.")]
	Revoked,
	/// Shared key-value store failed; only connectivity failures map to
	/// [`ErrorKind::StoreUnavailable`].
	#[error("Key-value store is unavailable.")]
	StoreUnavailable(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Client exceeded the request budget of the current window.
	#[error("Too many requests: limit {limit} in {window_seconds} seconds.")]
	RateLimitExceeded {
		/// Requests allowed per window.
		limit: u64,
		/// Window length in seconds.
		window_seconds: u64,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// External user store failed to answer a claims lookup.
	#[error("Claims lookup failed: {reason}.")]
	Lookup {
		/// Collaborator-supplied reason string.
		reason: String,
	},
	/// Identity provider handshake failed.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderError),
}
impl Error {
	/// Builds a [`Error::Malformed`] from any displayable reason.
	pub fn malformed(reason: impl Display) -> Self {
		Self::Malformed { reason: reason.to_string() }
	}

	/// Returns the taxonomy entry for this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Malformed { .. } => ErrorKind::Malformed,
			Error::SignatureInvalid => ErrorKind::SignatureInvalid,
			Error::Expired => ErrorKind::Expired,
			Error::WrongTokenType { .. } => ErrorKind::WrongTokenType,
			Error::Revoked => ErrorKind::Revoked,
			Error::StoreUnavailable(e) if e.is_retryable() => ErrorKind::StoreUnavailable,
			Error::StoreUnavailable(_) => ErrorKind::Internal,
			Error::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
			Error::Config(_) | Error::Lookup { .. } | Error::Provider(_) => ErrorKind::Internal,
		}
	}

	/// Stable machine-readable reason code, safe to return to clients.
	pub fn reason_code(&self) -> &'static str {
		self.kind().as_str()
	}
}

/// Error taxonomy with stable reason codes and HTTP status mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Structurally invalid token.
	Malformed,
	/// Tampered token.
	SignatureInvalid,
	/// Token past its expiry instant.
	Expired,
	/// Access token presented where a refresh token is required, or the reverse.
	WrongTokenType,
	/// Token id present in the revocation registry.
	Revoked,
	/// Store connectivity failure after the retry budget was spent.
	StoreUnavailable,
	/// Request budget exhausted for the current window.
	RateLimitExceeded,
	/// Configuration, collaborator, or provider failure.
	Internal,
}
impl ErrorKind {
	/// Returns the stable reason code.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Malformed => "malformed_token",
			ErrorKind::SignatureInvalid => "invalid_signature",
			ErrorKind::Expired => "token_expired",
			ErrorKind::WrongTokenType => "wrong_token_type",
			ErrorKind::Revoked => "token_revoked",
			ErrorKind::StoreUnavailable => "store_unavailable",
			ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
			ErrorKind::Internal => "internal_error",
		}
	}

	/// HTTP status the outer layer should answer with.
	pub const fn http_status(self) -> u16 {
		match self {
			ErrorKind::Malformed
			| ErrorKind::SignatureInvalid
			| ErrorKind::Expired
			| ErrorKind::WrongTokenType
			| ErrorKind::Revoked => 401,
			ErrorKind::RateLimitExceeded => 429,
			ErrorKind::StoreUnavailable => 503,
			ErrorKind::Internal => 500,
		}
	}

	/// Fixed end-user description; never derived from internal error messages.
	pub const fn description(self) -> &'static str {
		match self {
			ErrorKind::Malformed => "The token could not be parsed.",
			ErrorKind::SignatureInvalid => "Signature verification failed.",
			ErrorKind::Expired => "The token has expired.",
			ErrorKind::WrongTokenType => "The token type is not accepted here.",
			ErrorKind::Revoked => "The token has been revoked.",
			ErrorKind::StoreUnavailable => "Try again later.",
			ErrorKind::RateLimitExceeded => "Too many requests.",
			ErrorKind::Internal => "Internal error.",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Startup configuration failures. These are the only fatal errors in the crate.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No signing secret was configured.
	#[error("Signing secret is missing.")]
	MissingSigningSecret,
	/// Signing secret is shorter than the HS256 key size.
	#[error("Signing secret must be at least {min} bytes, got {actual}.")]
	WeakSigningSecret {
		/// Minimum accepted length in bytes.
		min: usize,
		/// Length of the configured secret.
		actual: usize,
	},
	/// A lifetime, window, or timeout was zero or negative.
	#[error("Configuration value `{field}` must be positive.")]
	NonPositive {
		/// Offending field name.
		field: &'static str,
	},
	/// A lifetime or window exceeded the supported range.
	#[error("Configuration value `{field}` must not exceed {max} seconds.")]
	OutOfRange {
		/// Offending field name.
		field: &'static str,
		/// Largest accepted value in seconds.
		max: i64,
	},
	/// Configuration sources could not be merged or extracted.
	#[error("Configuration could not be loaded.")]
	Load(#[from] Box<figment::Error>),
	/// Redis client could not be constructed.
	#[error("Store client could not be constructed: {message}.")]
	StoreClient {
		/// Backend-supplied message.
		message: String,
	},
}
impl From<figment::Error> for ConfigError {
	fn from(e: figment::Error) -> Self {
		Self::Load(Box::new(e))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_unavailable_with_source() {
		let store_error = StoreError::Backend { message: "connection refused".into() };
		let error: Error = store_error.clone().into();

		assert_eq!(error.kind(), ErrorKind::StoreUnavailable);

		let source = StdError::source(&error)
			.expect("Store unavailability should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn caller_side_store_errors_are_internal() {
		assert_eq!(Error::from(StoreError::TtlOutOfRange).kind(), ErrorKind::Internal);
		assert_eq!(
			Error::from(StoreError::Serialization { message: "nan".into() }).kind().http_status(),
			500
		);
		assert_eq!(
			Error::from(StoreError::Timeout { operation: "get", timeout_ms: 250 }).kind(),
			ErrorKind::StoreUnavailable
		);
	}

	#[test]
	fn rejection_kinds_map_to_stable_codes() {
		assert_eq!(Error::SignatureInvalid.reason_code(), "invalid_signature");
		assert_eq!(Error::Revoked.reason_code(), "token_revoked");
		assert_eq!(Error::malformed("bad segments").kind().http_status(), 401);
		assert_eq!(
			Error::RateLimitExceeded { limit: 5, window_seconds: 60 }.kind().http_status(),
			429
		);
		assert_eq!(Error::Lookup { reason: "db down".into() }.reason_code(), "internal_error");
	}

	#[test]
	fn kinds_serialize_as_snake_case() {
		let payload = serde_json::to_string(&ErrorKind::WrongTokenType)
			.expect("ErrorKind should serialize to JSON.");

		assert_eq!(payload, "\"wrong_token_type\"");
	}
}
