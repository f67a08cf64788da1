// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, SubjectId, TokenKind, TokenPair},
	lifecycle::{TokenManager, observe},
	obs::OpKind,
};

impl TokenManager {
	/// Mints an access + refresh pair for `subject` carrying `claims`.
	///
	/// Both tokens share the claims and carry distinct identifiers. Nothing is written to the
	/// store.
	pub async fn issue_tokens(&self, subject: &SubjectId, claims: &ClaimSet) -> Result<TokenPair> {
		observe(OpKind::Issue, "issue_tokens", async move {
			let (access_token, access) =
				self.codec.issue(subject, TokenKind::Access, claims, self.access_ttl)?;
			let (refresh_token, refresh) =
				self.codec.issue(subject, TokenKind::Refresh, claims, self.refresh_ttl)?;

			self.metrics.record_issued();

			Ok(TokenPair { access_token, refresh_token, access, refresh })
		})
		.await
	}
}
