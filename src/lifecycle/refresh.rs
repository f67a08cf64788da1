// self
use crate::{
	_prelude::*,
	auth::TokenKind,
	lifecycle::{AccessGrant, RefreshedAccess, TokenManager, observe, require_kind},
	obs::OpKind,
};

impl TokenManager {
	/// Mints a new access token from a refresh token.
	///
	/// The refresh token is checked the same way an access token is (signature, expiry, type,
	/// revocation), then the subject's current claims are fetched so role changes take effect
	/// on the next refresh. The refresh token itself is not rotated and stays valid until it
	/// expires or is revoked.
	pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess> {
		observe(OpKind::Refresh, "refresh", async move {
			let result: Result<_> = async {
				let payload = self.codec.decode(refresh_token)?;

				require_kind(&payload, TokenKind::Refresh)?;
				self.ensure_not_revoked(&payload.jti).await?;

				let claims = self.lookup.current_claims(&payload.sub).await?;
				let (access, minted) =
					self.codec.issue(&payload.sub, TokenKind::Access, &claims, self.access_ttl)?;

				Ok(RefreshedAccess { access, jti: minted.jti, expires_at: minted.exp })
			}
			.await;

			match &result {
				Ok(_) => self.metrics.record_refreshed(),
				Err(e) if e.kind().http_status() == 401 => self.metrics.record_rejected(),
				Err(_) => {},
			}

			result
		})
		.await
	}

	/// Accepts a refresh token that is intact, unexpired, of the refresh type, and not revoked.
	pub async fn validate_refresh(&self, refresh_token: &str) -> Result<AccessGrant> {
		observe(OpKind::Refresh, "validate_refresh", async move {
			let payload = self.codec.decode(refresh_token)?;

			require_kind(&payload, TokenKind::Refresh)?;
			self.ensure_not_revoked(&payload.jti).await?;

			Ok(AccessGrant::from(payload))
		})
		.await
	}
}
