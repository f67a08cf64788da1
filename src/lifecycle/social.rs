// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	directory::{AccountResolver, ResolvedAccount},
	lifecycle::{TokenManager, observe},
	obs::OpKind,
	provider::{CallbackParams, ExternalIdentity, ProviderRegistry},
};

/// Outcome of a provider-backed sign-in.
#[derive(Clone, Debug)]
pub struct SocialLogin {
	/// Freshly issued session tokens.
	pub tokens: TokenPair,
	/// Local account the identity resolved to.
	pub account: ResolvedAccount,
	/// Identity verified by the provider.
	pub identity: ExternalIdentity,
}

impl TokenManager {
	/// Signs a user in through the provider registered as `provider`.
	///
	/// The provider verifies the callback, `resolver` maps the verified identity onto a local
	/// subject (creating the account if needed), and a token pair is issued for that subject.
	pub async fn social_login(
		&self,
		registry: &ProviderRegistry,
		provider: &str,
		callback: &CallbackParams,
		resolver: &dyn AccountResolver,
	) -> Result<SocialLogin> {
		observe(OpKind::SocialLogin, "social_login", async move {
			let provider = registry.get(provider)?;
			let identity = provider.fetch_verified_identity(callback).await?;
			let account = resolver.resolve(&identity).await?;

			#[cfg(feature = "tracing")]
			tracing::debug!(
				provider = %identity.provider,
				subject = %account.subject,
				created = account.created,
				"External identity resolved."
			);

			let tokens = self.issue_tokens(&account.subject, &account.claims).await?;

			Ok(SocialLogin { tokens, account, identity })
		})
		.await
	}
}
