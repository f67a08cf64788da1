//! Token artifacts: kind, decoded payload, signed bearer string, and issued pairs.

pub mod pair;
pub mod payload;
pub mod secret;

// self
use crate::_prelude::*;

/// Token type carried in the `type` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived bearer credential authorizing API calls.
	Access,
	/// Long-lived credential exchanged for new access tokens.
	Refresh,
}
impl TokenKind {
	/// Returns the stable label used on the wire and in logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Access => "access",
			TokenKind::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
