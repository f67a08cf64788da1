//! Built-in pipeline stages.

// self
use crate::{
	_prelude::*,
	lifecycle::{AccessGrant, TokenManager},
	pipeline::{ApiResponse, RequestContext, Stage, StageFuture, StageOutcome},
	rate_limit::{RateLimitDecision, RateLimiter},
};

/// Throttles the caller by [`RequestContext::client_key`].
#[derive(Clone, Debug)]
pub struct RateLimitStage {
	limiter: RateLimiter,
	policy: Option<(u64, Duration)>,
}
impl RateLimitStage {
	/// Applies the limiter's configured default policy.
	pub fn new(limiter: RateLimiter) -> Self {
		Self { limiter, policy: None }
	}

	/// Applies `limit` requests per `window` instead of the default policy.
	pub fn with_policy(mut self, limit: u64, window: Duration) -> Self {
		self.policy = Some((limit, window));

		self
	}
}
impl Stage for RateLimitStage {
	fn name(&self) -> &'static str {
		"rate_limit"
	}

	fn apply<'a>(&'a self, ctx: &'a RequestContext) -> StageFuture<'a> {
		Box::pin(async move {
			let decision = match self.policy {
				Some((limit, window)) => self.limiter.check(&ctx.client_key, limit, window).await,
				None => self.limiter.check_default(&ctx.client_key).await,
			};

			match decision.and_then(RateLimitDecision::into_result) {
				Ok(_) => StageOutcome::Continue,
				Err(e) => StageOutcome::Respond(ApiResponse::from(&e)),
			}
		})
	}
}

/// Requires a valid access token, optionally carrying a role.
#[derive(Clone, Debug)]
pub struct RequireAccess {
	manager: Arc<TokenManager>,
	role: Option<String>,
}
impl RequireAccess {
	/// Requires any valid access token.
	pub fn new(manager: Arc<TokenManager>) -> Self {
		Self { manager, role: None }
	}

	/// Additionally requires `role` among the token's claims.
	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());

		self
	}

	fn authorize(&self, grant: AccessGrant) -> StageOutcome {
		match &self.role {
			Some(role) if !grant.claims.has_role(role) =>
				StageOutcome::Respond(ApiResponse::forbidden(role)),
			_ => StageOutcome::Authenticated(grant),
		}
	}
}
impl Stage for RequireAccess {
	fn name(&self) -> &'static str {
		"require_access"
	}

	fn apply<'a>(&'a self, ctx: &'a RequestContext) -> StageFuture<'a> {
		Box::pin(async move {
			let Some(token) = ctx.bearer_token() else {
				return StageOutcome::Respond(ApiResponse::missing_token());
			};

			match self.manager.validate_access(token).await {
				Ok(grant) => self.authorize(grant),
				Err(e) => StageOutcome::Respond(ApiResponse::from(&e)),
			}
		})
	}
}

/// Requires a valid refresh token, for the token renewal endpoint.
#[derive(Clone, Debug)]
pub struct RequireRefresh {
	manager: Arc<TokenManager>,
}
impl RequireRefresh {
	/// Creates the stage.
	pub fn new(manager: Arc<TokenManager>) -> Self {
		Self { manager }
	}
}
impl Stage for RequireRefresh {
	fn name(&self) -> &'static str {
		"require_refresh"
	}

	fn apply<'a>(&'a self, ctx: &'a RequestContext) -> StageFuture<'a> {
		Box::pin(async move {
			let Some(token) = ctx.bearer_token() else {
				return StageOutcome::Respond(ApiResponse::missing_token());
			};

			match self.manager.validate_refresh(token).await {
				Ok(grant) => StageOutcome::Authenticated(grant),
				Err(e) => StageOutcome::Respond(ApiResponse::from(&e)),
			}
		})
	}
}
