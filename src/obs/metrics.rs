// self
use crate::obs::{OpKind, OpOutcome};

/// Verdict labels for `session_guard_rate_limit_total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThrottleVerdict {
	/// The request fit in the window budget.
	Allowed,
	/// The window budget was exhausted.
	Denied,
	/// The store failed and the limiter let the request through.
	FailOpen,
}
impl ThrottleVerdict {
	/// Returns the metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ThrottleVerdict::Allowed => "allowed",
			ThrottleVerdict::Denied => "denied",
			ThrottleVerdict::FailOpen => "fail_open",
		}
	}
}

/// Increments `session_guard_op_total{op, outcome}` (no-op without the `metrics` feature).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_guard_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Increments `session_guard_rate_limit_total{verdict}` once per throttling check.
pub fn record_throttle_verdict(verdict: ThrottleVerdict) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_guard_rate_limit_total", "verdict" => verdict.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = verdict;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn throttle_verdicts_use_stable_labels() {
		assert_eq!(ThrottleVerdict::Allowed.as_str(), "allowed");
		assert_eq!(ThrottleVerdict::Denied.as_str(), "denied");
		assert_eq!(ThrottleVerdict::FailOpen.as_str(), "fail_open");

		record_throttle_verdict(ThrottleVerdict::FailOpen);
		record_op_outcome(OpKind::RateLimit, OpOutcome::Rejected);
	}
}
