//! Optional observability helpers for token lifecycle and throttling operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_guard.op` with the `op` (operation),
//!   `stage` (entry point), and `outcome` fields, plus warnings for fail-open decisions and store
//!   retries.
//! - Enable `metrics` to increment `session_guard_op_total{op, outcome}` for every
//!   attempt/success/rejection/failure and `session_guard_rate_limit_total{verdict}` for every
//!   throttling check.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token pair issuance.
	Issue,
	/// Access token validation.
	ValidateAccess,
	/// Access token renewal from a refresh token.
	Refresh,
	/// Token revocation, including logout.
	Revoke,
	/// Provider-backed sign-in.
	SocialLogin,
	/// Rate limit check.
	RateLimit,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Issue => "issue",
			OpKind::ValidateAccess => "validate_access",
			OpKind::Refresh => "refresh",
			OpKind::Revoke => "revoke",
			OpKind::SocialLogin => "social_login",
			OpKind::RateLimit => "rate_limit",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// The request was refused: bad token, revoked token, or throttled client.
	Rejected,
	/// Infrastructure failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Rejected => "rejected",
			OpOutcome::Failure => "failure",
		}
	}

	/// Classifies a finished operation.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => OpOutcome::Success,
			Err(e) => match e.kind() {
				ErrorKind::StoreUnavailable | ErrorKind::Internal => OpOutcome::Failure,
				_ => OpOutcome::Rejected,
			},
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
