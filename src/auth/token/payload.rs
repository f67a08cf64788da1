//! Decoded token payload and lifetime helpers.

// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, SubjectId, TokenId, TokenKind},
};

/// Payload signed into every token. Never mutated after issuance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Subject identity the token was issued to.
	pub sub: SubjectId,
	/// Unique token identifier, used as the revocation key.
	pub jti: TokenId,
	/// Access or refresh.
	#[serde(rename = "type")]
	pub kind: TokenKind,
	/// Issued-at instant, whole seconds.
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant, whole seconds.
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
	/// Claims embedded at issuance.
	#[serde(default)]
	pub claims: ClaimSet,
}
impl TokenPayload {
	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.exp
	}

	/// Remaining lifetime at `instant`; zero or negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.exp - instant
	}
}

/// Truncates an instant to whole seconds so it survives the timestamp encoding unchanged.
pub(crate) fn whole_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
