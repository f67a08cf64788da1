//! Token lifecycle orchestration: issuance, validation, refresh, revocation, and social sign-in.
//!
//! [`TokenManager`] owns the codec, the revocation registry, and the claims lookup. Every token
//! check decodes first (structure, signature, expiry) and only then consults the registry, so a
//! forged or expired token never costs a store round trip. Nothing in this layer retries; store
//! calls have already been retried once by the store wrapper.

mod issue;
mod metrics;
mod refresh;
mod revoke;
mod social;
mod validate;

pub use metrics::LifecycleMetrics;
pub use social::SocialLogin;

// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, SignedToken, SubjectId, TokenId, TokenKind, TokenPayload},
	clock::Clock,
	codec::TokenCodec,
	config::{AuthConfig, FailurePolicy},
	directory::ClaimsLookup,
	error::ConfigError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	revocation::RevocationRegistry,
};

/// Identity and claims carried by a validated token.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessGrant {
	/// Token subject.
	pub subject: SubjectId,
	/// Claims embedded at issuance.
	pub claims: ClaimSet,
	/// Token identifier.
	pub jti: TokenId,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl From<TokenPayload> for AccessGrant {
	fn from(payload: TokenPayload) -> Self {
		Self { subject: payload.sub, claims: payload.claims, jti: payload.jti, expires_at: payload.exp }
	}
}

/// New access token minted from a refresh token.
#[derive(Clone, Debug)]
pub struct RefreshedAccess {
	/// Bearer string of the new access token.
	pub access: SignedToken,
	/// Identifier of the new access token.
	pub jti: TokenId,
	/// Expiry instant of the new access token.
	pub expires_at: OffsetDateTime,
}

/// Token to revoke, either as presented by a client or by its identifying fields.
#[derive(Clone, Debug)]
pub enum RevocationTarget {
	/// A serialized token; its signature must verify, expiry is allowed.
	Token(SignedToken),
	/// An already-decoded token.
	Id {
		/// Token identifier.
		jti: TokenId,
		/// Owning subject.
		subject: SubjectId,
		/// Expiry instant of the token.
		expires_at: OffsetDateTime,
	},
}
impl From<SignedToken> for RevocationTarget {
	fn from(token: SignedToken) -> Self {
		Self::Token(token)
	}
}
impl From<&AccessGrant> for RevocationTarget {
	fn from(grant: &AccessGrant) -> Self {
		Self::Id { jti: grant.jti.clone(), subject: grant.subject.clone(), expires_at: grant.expires_at }
	}
}

/// Issues, validates, refreshes, and revokes session tokens.
#[derive(Clone)]
pub struct TokenManager {
	codec: TokenCodec,
	registry: RevocationRegistry,
	lookup: Arc<dyn ClaimsLookup>,
	access_ttl: Duration,
	refresh_ttl: Duration,
	revocation_failure_policy: FailurePolicy,
	/// Shared counters for lifecycle outcomes.
	pub metrics: Arc<LifecycleMetrics>,
}
impl TokenManager {
	/// Creates a manager from explicit parts.
	pub fn new(
		codec: TokenCodec,
		registry: RevocationRegistry,
		lookup: Arc<dyn ClaimsLookup>,
		access_ttl: Duration,
		refresh_ttl: Duration,
	) -> Self {
		Self {
			codec,
			registry,
			lookup,
			access_ttl,
			refresh_ttl,
			revocation_failure_policy: FailurePolicy::FailClosed,
			metrics: Default::default(),
		}
	}

	/// Validates `config` and builds a manager from it.
	pub fn from_config(
		config: &AuthConfig,
		registry: RevocationRegistry,
		lookup: Arc<dyn ClaimsLookup>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		let codec = TokenCodec::new(&config.signing_secret, clock)?;

		Ok(Self::new(codec, registry, lookup, config.access_ttl(), config.refresh_ttl())
			.with_revocation_failure_policy(config.revocation_failure_policy))
	}

	/// Overrides the behaviour used when the registry cannot be consulted.
	pub fn with_revocation_failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.revocation_failure_policy = policy;

		self
	}

	/// Access token lifetime.
	pub fn access_ttl(&self) -> Duration {
		self.access_ttl
	}

	/// Refresh token lifetime.
	pub fn refresh_ttl(&self) -> Duration {
		self.refresh_ttl
	}

	/// Revocation registry shared with this manager.
	pub fn registry(&self) -> &RevocationRegistry {
		&self.registry
	}

	/// Codec used to sign and verify tokens.
	pub fn codec(&self) -> &TokenCodec {
		&self.codec
	}

	/// Fails with [`Error::Revoked`] if `jti` is in the registry, honouring the failure policy.
	async fn ensure_not_revoked(&self, jti: &TokenId) -> Result<()> {
		match self.registry.is_revoked(jti).await {
			Ok(false) => Ok(()),
			Ok(true) => Err(Error::Revoked),
			Err(e) => match self.revocation_failure_policy {
				FailurePolicy::FailClosed => Err(e.into()),
				FailurePolicy::FailOpen => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						jti = %jti,
						error = %e,
						"Revocation registry unavailable, accepting token."
					);
					#[cfg(not(feature = "tracing"))]
					let _ = e;

					Ok(())
				},
			},
		}
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("codec", &self.codec)
			.field("access_ttl", &self.access_ttl)
			.field("refresh_ttl", &self.refresh_ttl)
			.field("revocation_failure_policy", &self.revocation_failure_policy)
			.finish()
	}
}

fn require_kind(payload: &TokenPayload, expected: TokenKind) -> Result<()> {
	if payload.kind == expected {
		Ok(())
	} else {
		Err(Error::WrongTokenType { expected: expected.as_str(), found: payload.kind.as_str() })
	}
}

/// Runs `fut` inside an operation span and records its outcome.
async fn observe<T, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage);

	obs::record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	#[cfg(feature = "tracing")]
	if let Err(e) = &result {
		tracing::debug!(op = kind.as_str(), stage, reason = e.reason_code(), "Operation failed.");
	}

	let outcome = OpOutcome::of(&result);

	span.record_outcome(outcome);
	obs::record_op_outcome(kind, outcome);

	result
}
