// self
use crate::{
	_prelude::*,
	auth::TokenKind,
	lifecycle::{AccessGrant, TokenManager, observe, require_kind},
	obs::OpKind,
};

impl TokenManager {
	/// Accepts an access token that is intact, unexpired, of the access type, and not revoked.
	///
	/// Registry failures follow the revocation failure policy: fail-closed surfaces
	/// [`Error::StoreUnavailable`], fail-open accepts the token and logs a warning.
	pub async fn validate_access(&self, token: &str) -> Result<AccessGrant> {
		observe(OpKind::ValidateAccess, "validate_access", async move {
			let result: Result<_> = async {
				let payload = self.codec.decode(token)?;

				require_kind(&payload, TokenKind::Access)?;
				self.ensure_not_revoked(&payload.jti).await?;

				Ok(AccessGrant::from(payload))
			}
			.await;

			match &result {
				Ok(_) => self.metrics.record_validated(),
				Err(e) if e.kind().http_status() == 401 => self.metrics.record_rejected(),
				Err(_) => {},
			}

			result
		})
		.await
	}
}
