//! Claim modeling: ordered role sets plus free-form extra claims.

// std
use std::{collections::HashSet, slice::Iter};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating role names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RoleValidationError {
	/// Empty role entries are not allowed.
	#[error("Role entries cannot be empty.")]
	Empty,
	/// Role names cannot contain embedded whitespace characters.
	#[error("Role contains whitespace: {role}.")]
	ContainsWhitespace {
		/// The offending role string.
		role: String,
	},
}

/// Ordered, de-duplicated set of role names.
///
/// Insertion order is kept (the first occurrence of a duplicate wins) because the user store
/// hands roles back in a meaningful order and tokens should reflect it verbatim.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(Arc<[String]>);
impl RoleSet {
	/// Creates a role set from any iterator, validating each entry.
	pub fn new<I, S>(roles: I) -> Result<Self, RoleValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut seen = HashSet::new();
		let mut ordered = Vec::new();

		for role in roles {
			let owned: String = role.into();

			if owned.is_empty() {
				return Err(RoleValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(RoleValidationError::ContainsWhitespace { role: owned });
			}
			if seen.insert(owned.clone()) {
				ordered.push(owned);
			}
		}

		Ok(Self(Arc::from(ordered)))
	}

	/// Number of distinct roles.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no roles are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided role.
	pub fn contains(&self, role: &str) -> bool {
		self.0.iter().any(|candidate| candidate == role)
	}

	/// Iterator over role names in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	/// Returns the underlying slice of role names.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl Debug for RoleSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RoleSet").field(&self.0).finish()
	}
}
impl Display for RoleSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(","))
	}
}

/// Iterator over role names.
pub struct RoleIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for RoleIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a RoleSet {
	type IntoIter = RoleIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		RoleIter { inner: self.0.iter() }
	}
}
impl TryFrom<Vec<String>> for RoleSet {
	type Error = RoleValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Serialize for RoleSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for role in self.0.iter() {
			seq.serialize_element(role)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for RoleSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		RoleSet::new(values).map_err(DeError::custom)
	}
}

/// Claims embedded into a token at issuance; immutable once signed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
	/// Roles granted to the subject.
	#[serde(default)]
	pub roles: RoleSet,
	/// Additional named claims, carried verbatim.
	#[serde(default, flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl ClaimSet {
	/// Creates a claim set holding only the provided roles.
	pub fn with_roles<I, S>(roles: I) -> Result<Self, RoleValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { roles: RoleSet::new(roles)?, extra: BTreeMap::new() })
	}

	/// Adds or replaces an extra claim. The `roles` name is reserved and ignored here.
	pub fn with_claim(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
		let name = name.into();

		if name != "roles" {
			self.extra.insert(name, value);
		}

		self
	}

	/// Returns true if the claim set grants the provided role.
	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains(role)
	}

	/// Looks up an extra claim by name.
	pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
		self.extra.get(name)
	}
}
