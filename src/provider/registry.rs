//! Name-keyed registry of identity providers, assembled once at startup.

// self
use crate::{
	_prelude::*,
	provider::{IdentityProvider, ProviderError},
};

/// Immutable lookup table from provider name to implementation.
///
/// Build it with [`ProviderRegistry::builder`], then share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
	providers: BTreeMap<String, Arc<dyn IdentityProvider>>,
}
impl ProviderRegistry {
	/// Starts an empty builder.
	pub fn builder() -> ProviderRegistryBuilder {
		ProviderRegistryBuilder::default()
	}

	/// Returns the provider registered under `name`.
	pub fn get(&self, name: &str) -> Result<Arc<dyn IdentityProvider>, ProviderError> {
		self.providers
			.get(name)
			.cloned()
			.ok_or_else(|| ProviderError::UnknownProvider { name: name.to_owned() })
	}

	/// Registered names in sorted order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.providers.keys().map(String::as_str)
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.providers.len()
	}

	/// Returns `true` if no provider is registered.
	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.providers.keys()).finish()
	}
}

/// Collects providers and rejects duplicate names.
#[derive(Default)]
pub struct ProviderRegistryBuilder {
	providers: BTreeMap<String, Arc<dyn IdentityProvider>>,
}
impl ProviderRegistryBuilder {
	/// Adds `provider` under its own [`IdentityProvider::name`].
	pub fn register(mut self, provider: Arc<dyn IdentityProvider>) -> Result<Self, ProviderError> {
		let name = provider.name().to_string();

		if self.providers.contains_key(&name) {
			return Err(ProviderError::DuplicateProvider { name });
		}

		self.providers.insert(name, provider);

		Ok(self)
	}

	/// Freezes the registry.
	pub fn build(self) -> ProviderRegistry {
		ProviderRegistry { providers: self.providers }
	}
}
impl Debug for ProviderRegistryBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistryBuilder")
			.field("providers", &self.providers.keys().collect::<Vec<_>>())
			.finish()
	}
}
