//! Revocation registry: a denylist of token ids that lives exactly as long as the tokens do.

// self
use crate::{
	_prelude::*,
	auth::{SubjectId, TokenId},
	store::{KvStore, StoreError},
};

const KEY_PREFIX: &str = "revoked:";

/// Store key under which a revoked token id is recorded.
pub fn revocation_key(jti: &TokenId) -> String {
	format!("{KEY_PREFIX}{}", jti.as_ref())
}

/// Records revoked token ids in the shared store.
///
/// Entries always carry a positive TTL equal to the token's remaining lifetime, so the registry
/// never grows past the set of tokens that could still validate.
#[derive(Clone)]
pub struct RevocationRegistry {
	store: Arc<dyn KvStore>,
}
impl RevocationRegistry {
	/// Creates a registry over the provided store.
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	/// Marks `jti` as revoked for `ttl`, remembering the owning subject.
	///
	/// A non-positive `ttl` is rejected with [`StoreError::NonPositiveTtl`]; callers skip tokens
	/// that have already expired.
	pub async fn add(&self, jti: &TokenId, subject: &SubjectId, ttl: Duration) -> Result<(), StoreError> {
		if !ttl.is_positive() {
			return Err(StoreError::NonPositiveTtl);
		}

		self.store.set_with_expiry(&revocation_key(jti), subject.as_ref(), ttl).await
	}

	/// Returns `true` while a revocation entry for `jti` is live.
	pub async fn is_revoked(&self, jti: &TokenId) -> Result<bool, StoreError> {
		self.store.exists(&revocation_key(jti)).await
	}

	/// Returns the subject that owned a revoked token, if the entry is still live.
	pub async fn owner(&self, jti: &TokenId) -> Result<Option<SubjectId>, StoreError> {
		let Some(raw) = self.store.get(&revocation_key(jti)).await? else {
			return Ok(None);
		};
		let subject = SubjectId::new(&raw).map_err(|e| StoreError::Serialization {
			message: format!("Revocation entry owner `{raw}` is invalid: {e}"),
		})?;

		Ok(Some(subject))
	}
}
impl Debug for RevocationRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RevocationRegistry(..)")
	}
}
