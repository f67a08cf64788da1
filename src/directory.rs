//! User store boundary: current claims per subject and external-identity resolution.
//!
//! Persistent user storage is owned by the embedding service. The lifecycle manager only needs
//! the two capabilities below; [`StaticDirectory`] is an in-memory implementation for tests and
//! single-process setups.

// std
use std::collections::btree_map::Entry;
// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, RoleValidationError, SubjectId},
	provider::ExternalIdentity,
};

/// Boxed future returned by directory operations.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Supplies the claims a subject currently holds.
pub trait ClaimsLookup
where
	Self: Send + Sync,
{
	/// Returns the up-to-date claims for `subject`, or [`Error::Lookup`].
	fn current_claims<'a>(&'a self, subject: &'a SubjectId) -> DirectoryFuture<'a, ClaimSet>;
}

/// Maps a verified external identity onto a local subject, creating one when needed.
pub trait AccountResolver
where
	Self: Send + Sync,
{
	/// Finds or creates the local account for `identity`.
	fn resolve<'a>(&'a self, identity: &'a ExternalIdentity) -> DirectoryFuture<'a, ResolvedAccount>;
}

/// Local account an external identity resolved to.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAccount {
	/// Local subject.
	pub subject: SubjectId,
	/// Claims to embed in the issued tokens.
	pub claims: ClaimSet,
	/// Whether the account was created by this resolution.
	pub created: bool,
}

#[derive(Clone, Debug)]
struct Account {
	email: Option<String>,
	display_name: Option<String>,
	claims: ClaimSet,
}

#[derive(Debug, Default)]
struct DirectoryState {
	// Ordered so identity matching picks the same account every time.
	accounts: BTreeMap<SubjectId, Account>,
	// (provider, social id) -> subject
	links: HashMap<(String, String), SubjectId>,
}

/// In-memory user directory.
///
/// Social sign-in resolves an identity by existing link, then by email, then by display name,
/// and otherwise creates `<provider>-<social id>` with the `user` role. Ties go to the lowest
/// subject. A generated subject that is already taken fails with [`Error::Lookup`].
#[derive(Debug, Default)]
pub struct StaticDirectory {
	state: RwLock<DirectoryState>,
}
impl StaticDirectory {
	/// Adds or replaces an account with the provided claims.
	pub fn insert(&self, subject: SubjectId, claims: ClaimSet) {
		self.insert_with_contact(subject, None, None, claims);
	}

	/// Adds or replaces an account with contact details used for identity matching.
	pub fn insert_with_contact(
		&self,
		subject: SubjectId,
		email: Option<String>,
		display_name: Option<String>,
		claims: ClaimSet,
	) {
		self.state.write().accounts.insert(subject, Account { email, display_name, claims });
	}

	/// Replaces the roles of `subject`, creating the account if needed.
	pub fn set_roles<I, S>(&self, subject: &SubjectId, roles: I) -> Result<(), RoleValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let roles = ClaimSet::with_roles(roles)?.roles;
		let mut state = self.state.write();
		let account = state.accounts.entry(subject.clone()).or_insert_with(|| Account {
			email: None,
			display_name: None,
			claims: ClaimSet::default(),
		});

		account.claims.roles = roles;

		Ok(())
	}

	/// Removes an account and its provider links.
	pub fn remove(&self, subject: &SubjectId) -> bool {
		let mut state = self.state.write();

		state.links.retain(|_, linked| linked != subject);

		state.accounts.remove(subject).is_some()
	}

	/// Subject linked to a provider account, if any.
	pub fn linked_subject(&self, provider: &str, social_id: &str) -> Option<SubjectId> {
		self.state.read().links.get(&(provider.to_owned(), social_id.to_owned())).cloned()
	}

	fn resolve_now(&self, identity: &ExternalIdentity) -> Result<ResolvedAccount> {
		let link = (identity.provider.to_string(), identity.social_id.clone());
		let mut state = self.state.write();

		let linked = state.links.get(&link).and_then(|subject| {
			state.accounts.get(subject).map(|account| (subject.clone(), account.claims.clone()))
		});

		if let Some((subject, claims)) = linked {
			return Ok(ResolvedAccount { subject, claims, created: false });
		}

		let matched = state
			.accounts
			.iter()
			.find(|(_, account)| {
				identity.email.is_some() && account.email.as_deref() == identity.email.as_deref()
			})
			.or_else(|| {
				state.accounts.iter().find(|(_, account)| {
					identity.display_name.is_some()
						&& account.display_name.as_deref() == identity.display_name.as_deref()
				})
			})
			.map(|(subject, account)| (subject.clone(), account.claims.clone()));
		let (subject, claims, created) = match matched {
			Some((subject, claims)) => (subject, claims, false),
			None => {
				let subject = SubjectId::new(format!("{}-{}", link.0, link.1))
					.map_err(|e| Error::Lookup { reason: e.to_string() })?;
				let claims = ClaimSet::with_roles(["user"])
					.map_err(|e| Error::Lookup { reason: e.to_string() })?;

				match state.accounts.entry(subject.clone()) {
					Entry::Occupied(_) =>
						return Err(Error::Lookup {
							reason: format!("subject `{subject}` already belongs to another account"),
						}),
					Entry::Vacant(slot) => {
						slot.insert(Account {
							email: identity.email.clone(),
							display_name: identity.display_name.clone(),
							claims: claims.clone(),
						});
					},
				}

				(subject, claims, true)
			},
		};

		state.links.insert(link, subject.clone());

		Ok(ResolvedAccount { subject, claims, created })
	}
}
impl ClaimsLookup for StaticDirectory {
	fn current_claims<'a>(&'a self, subject: &'a SubjectId) -> DirectoryFuture<'a, ClaimSet> {
		Box::pin(async move {
			self.state
				.read()
				.accounts
				.get(subject)
				.map(|account| account.claims.clone())
				.ok_or_else(|| Error::Lookup { reason: format!("unknown subject `{subject}`") })
		})
	}
}
impl AccountResolver for StaticDirectory {
	fn resolve<'a>(&'a self, identity: &'a ExternalIdentity) -> DirectoryFuture<'a, ResolvedAccount> {
		Box::pin(async move { self.resolve_now(identity) })
	}
}
