//! Framework-neutral request pipeline.
//!
//! A [`Pipeline`] runs its stages in the order they were added. Each stage either lets the
//! request continue, continues with an authenticated [`AccessGrant`], or ends the request with
//! an [`ApiResponse`]. The embedding HTTP layer builds one pipeline per route class and
//! translates the outcome into its own response type.

pub mod response;
pub mod stages;

pub use response::ApiResponse;
pub use stages::*;

// self
use crate::{_prelude::*, lifecycle::AccessGrant, rate_limit::ClientKey};

/// Boxed future returned by [`Stage::apply`].
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = StageOutcome> + 'a + Send>>;

/// Per-request inputs visible to every stage.
#[derive(Clone)]
pub struct RequestContext {
	/// Throttling identity of the caller.
	pub client_key: ClientKey,
	/// Raw `Authorization` header value, if any.
	pub authorization: Option<String>,
}
impl RequestContext {
	/// Creates a context for an unauthenticated request.
	pub fn new(client_key: ClientKey) -> Self {
		Self { client_key, authorization: None }
	}

	/// Attaches the raw `Authorization` header.
	pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
		self.authorization = Some(header.into());

		self
	}

	/// Token carried by a `Bearer` authorization header (scheme matched case-insensitively).
	pub fn bearer_token(&self) -> Option<&str> {
		let header = self.authorization.as_deref()?.trim();
		let (scheme, token) = header.split_once(' ')?;
		let token = token.trim();

		(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
	}
}
impl Debug for RequestContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestContext")
			.field("client_key", &self.client_key)
			.field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Decision returned by a single stage.
#[derive(Clone, Debug)]
pub enum StageOutcome {
	/// Proceed to the next stage.
	Continue,
	/// Proceed, recording the authenticated grant.
	Authenticated(AccessGrant),
	/// Stop and answer with this response.
	Respond(ApiResponse),
}

/// Final decision of a pipeline run.
#[derive(Clone, Debug)]
pub enum PipelineOutcome {
	/// Every stage passed; carries the last grant produced, if any.
	Continue(Option<AccessGrant>),
	/// A stage ended the request.
	Respond(ApiResponse),
}

/// One step of request admission (throttling, authentication, authorization).
pub trait Stage
where
	Self: Send + Sync,
{
	/// Label used in spans and logs.
	fn name(&self) -> &'static str;

	/// Evaluates the stage for `ctx`.
	fn apply<'a>(&'a self, ctx: &'a RequestContext) -> StageFuture<'a>;
}

/// Ordered list of stages.
#[derive(Clone, Default)]
pub struct Pipeline {
	stages: Vec<Arc<dyn Stage>>,
}
impl Pipeline {
	/// Creates an empty pipeline.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `stage`.
	pub fn stage<S>(mut self, stage: S) -> Self
	where
		S: 'static + Stage,
	{
		self.stages.push(Arc::new(stage));

		self
	}

	/// Appends an already shared stage.
	pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
		self.stages.push(stage);

		self
	}

	/// Number of stages.
	pub fn len(&self) -> usize {
		self.stages.len()
	}

	/// Returns `true` if the pipeline has no stages.
	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}

	/// Runs every stage in order, stopping at the first terminal response.
	pub async fn run(&self, ctx: &RequestContext) -> PipelineOutcome {
		let mut grant = None;

		for stage in &self.stages {
			match stage.apply(ctx).await {
				StageOutcome::Continue => {},
				StageOutcome::Authenticated(next) => grant = Some(next),
				StageOutcome::Respond(response) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(
						stage = stage.name(),
						status = response.status,
						client_key = %ctx.client_key,
						"Pipeline stopped."
					);

					return PipelineOutcome::Respond(response);
				},
			}
		}

		PipelineOutcome::Continue(grant)
	}
}
impl Debug for Pipeline {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.stages.iter().map(|stage| stage.name())).finish()
	}
}
