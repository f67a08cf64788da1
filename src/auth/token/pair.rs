//! Access + refresh pair returned by issuance.

// self
use crate::{
	_prelude::*,
	auth::{SignedToken, TokenId, TokenPayload},
};

/// Tokens minted for one session. Both carry the same claims and distinct ids.
///
/// Only the two bearer strings serialize; the payloads stay server-side for bookkeeping.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
	/// Short-lived access token.
	pub access_token: SignedToken,
	/// Long-lived refresh token.
	pub refresh_token: SignedToken,
	/// Payload signed into the access token.
	#[serde(skip)]
	pub access: TokenPayload,
	/// Payload signed into the refresh token.
	#[serde(skip)]
	pub refresh: TokenPayload,
}
impl TokenPair {
	/// Identifier of the access token.
	pub fn access_jti(&self) -> &TokenId {
		&self.access.jti
	}

	/// Identifier of the refresh token.
	pub fn refresh_jti(&self) -> &TokenId {
		&self.refresh.jti
	}

	/// Expiry instant of the access token.
	pub fn access_expires_at(&self) -> OffsetDateTime {
		self.access.exp
	}

	/// Expiry instant of the refresh token.
	pub fn refresh_expires_at(&self) -> OffsetDateTime {
		self.refresh.exp
	}
}
