// self
use crate::{
	_prelude::*,
	auth::{SignedToken, SubjectId, TokenId},
	lifecycle::{RevocationTarget, TokenManager, observe},
	obs::OpKind,
};

impl TokenManager {
	/// Revokes a token for the rest of its lifetime.
	///
	/// A serialized target must carry a valid signature but may already be expired. Tokens whose
	/// remaining lifetime is zero or negative are skipped: they can no longer validate anyway.
	pub async fn revoke(&self, target: impl Into<RevocationTarget>) -> Result<()> {
		let target = target.into();

		observe(OpKind::Revoke, "revoke", async move {
			let (jti, subject, expires_at) = match target {
				RevocationTarget::Token(token) => {
					let payload = self.codec.decode_unexpired_or_not(token.expose())?;

					(payload.jti, payload.sub, payload.exp)
				},
				RevocationTarget::Id { jti, subject, expires_at } => (jti, subject, expires_at),
			};

			self.write_revocation(&jti, &subject, expires_at - self.codec.now()).await
		})
		.await
	}

	/// Revokes `jti` for an explicit `ttl`; a non-positive `ttl` is a no-op.
	pub async fn revoke_for(&self, jti: &TokenId, subject: &SubjectId, ttl: Duration) -> Result<()> {
		observe(OpKind::Revoke, "revoke_for", self.write_revocation(jti, subject, ttl)).await
	}

	/// Ends a session from its access token: the token must validate, then it is revoked.
	pub async fn logout(&self, access_token: &str) -> Result<()> {
		let grant = self.validate_access(access_token).await?;

		self.revoke(&grant).await
	}

	/// Revokes both tokens of a session, e.g. after a password change or account deletion.
	pub async fn logout_session(&self, access: &SignedToken, refresh: &SignedToken) -> Result<()> {
		self.revoke(access.clone()).await?;
		self.revoke(refresh.clone()).await
	}

	async fn write_revocation(&self, jti: &TokenId, subject: &SubjectId, ttl: Duration) -> Result<()> {
		if !ttl.is_positive() {
			#[cfg(feature = "tracing")]
			tracing::debug!(jti = %jti, "Token already expired, skipping revocation entry.");

			return Ok(());
		}

		self.registry.add(jti, subject, ttl).await?;
		self.metrics.record_revoked();

		Ok(())
	}
}
