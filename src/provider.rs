//! Identity provider boundary for third-party sign-in.
//!
//! Provider-specific HTTP exchanges live outside this crate. An [`IdentityProvider`] only has to
//! produce the redirect target for the consent screen and, once the user comes back, a verified
//! [`ExternalIdentity`]. [`AuthorizeEndpoint`] covers the redirect half for standard OAuth 2.0
//! authorization-code providers. Providers are looked up by name through an explicitly built
//! [`ProviderRegistry`].

pub mod registry;

pub use registry::*;

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, auth::ProviderName};

const STATE_LEN: usize = 32;

/// Boxed future returned by [`IdentityProvider::fetch_verified_identity`].
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Capability every third-party identity provider implements.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	/// Name the provider is registered under (e.g. `google`).
	fn name(&self) -> &ProviderName;

	/// Builds the consent-screen URL that sends the user back to `callback_url` with `state`.
	fn redirect_target(&self, callback_url: &Url, state: &str) -> Result<Url, ProviderError>;

	/// Completes the provider exchange for `callback` and returns the verified identity.
	fn fetch_verified_identity<'a>(
		&'a self,
		callback: &'a CallbackParams,
	) -> ProviderFuture<'a, ExternalIdentity>;
}

/// Identity asserted by a provider after a successful exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
	/// Provider that verified the identity.
	pub provider: ProviderName,
	/// Provider-scoped account identifier.
	pub social_id: String,
	/// Email reported by the provider, when shared.
	pub email: Option<String>,
	/// Display name reported by the provider, when shared.
	pub display_name: Option<String>,
}

/// Query parameters delivered to the callback URL.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code, absent when the user denied consent.
	pub code: Option<String>,
	/// State echoed back by the provider.
	pub state: Option<String>,
	/// Provider error code, when the provider reported one.
	pub error: Option<String>,
	/// Any other parameters.
	pub extra: BTreeMap<String, String>,
}
impl CallbackParams {
	/// Parses the query string of a callback URL.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (name, value) in url.query_pairs() {
			match name.as_ref() {
				"code" => params.code = Some(value.into_owned()),
				"state" => params.state = Some(value.into_owned()),
				"error" => params.error = Some(value.into_owned()),
				_ => {
					params.extra.insert(name.into_owned(), value.into_owned());
				},
			}
		}

		params
	}

	/// Checks the echoed state against the value issued with the redirect.
	pub fn verify_state(&self, expected: &str) -> Result<(), ProviderError> {
		match self.state.as_deref() {
			Some(returned) if returned == expected => Ok(()),
			_ => Err(ProviderError::StateMismatch),
		}
	}

	/// Returns the authorization code or the reason the provider withheld it.
	pub fn require_code(&self) -> Result<&str, ProviderError> {
		match (&self.code, &self.error) {
			(Some(code), _) if !code.is_empty() => Ok(code.as_str()),
			(_, Some(error)) => Err(ProviderError::Denied { reason: error.clone() }),
			_ => Err(ProviderError::Denied { reason: "missing authorization code".into() }),
		}
	}
}
impl Debug for CallbackParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackParams")
			.field("code", &self.code.as_ref().map(|_| "<redacted>"))
			.field("state", &self.state)
			.field("error", &self.error)
			.field("extra", &self.extra)
			.finish()
	}
}

/// Authorization endpoint of a standard OAuth 2.0 provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizeEndpoint {
	url: Url,
	client_id: String,
	scope: Option<String>,
}
impl AuthorizeEndpoint {
	/// Validates that `url` is HTTPS and records the client identifier.
	pub fn new(url: Url, client_id: impl Into<String>) -> Result<Self, ProviderError> {
		if url.scheme() != "https" {
			return Err(ProviderError::InsecureEndpoint { url: url.to_string() });
		}

		Ok(Self { url, client_id: client_id.into(), scope: None })
	}

	/// Requests `scope` (already delimited the way the provider expects).
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Builds the authorization-code redirect URL.
	pub fn redirect_url(&self, callback_url: &Url, state: &str) -> Url {
		let mut url = self.url.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.client_id);
		pairs.append_pair("redirect_uri", callback_url.as_str());

		if let Some(scope) = &self.scope {
			pairs.append_pair("scope", scope);
		}

		pairs.append_pair("state", state);

		drop(pairs);

		url
	}
}

/// Generates an opaque state value for a redirect round trip.
pub fn generate_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

/// Failures raised at the provider boundary.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// No provider is registered under the requested name.
	#[error("Identity provider `{name}` is not registered.")]
	UnknownProvider {
		/// Requested provider name.
		name: String,
	},
	/// Two providers were registered under the same name.
	#[error("Identity provider `{name}` is registered twice.")]
	DuplicateProvider {
		/// Conflicting provider name.
		name: String,
	},
	/// Provider endpoints must use HTTPS.
	#[error("Provider endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Offending URL.
		url: String,
	},
	/// Returned state does not match the issued one.
	#[error("Callback state does not match.")]
	StateMismatch,
	/// User or provider declined the authorization.
	#[error("Authorization was denied: {reason}.")]
	Denied {
		/// Provider-supplied reason.
		reason: String,
	},
	/// Provider exchange failed (transport, token endpoint, or profile endpoint).
	#[error("Provider exchange failed: {message}.")]
	Exchange {
		/// Human-readable error payload.
		message: String,
	},
	/// Provider answered without a usable account identifier.
	#[error("Provider returned an unusable identity: {message}.")]
	Identity {
		/// Human-readable error payload.
		message: String,
	},
}
