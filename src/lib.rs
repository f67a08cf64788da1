//! Session token lifecycle and distributed rate limiting for authentication services: issue,
//! validate, refresh, and revoke signed tokens, and throttle clients through a shared
//! key-value store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod obs;
pub mod pipeline;
pub mod provider;
pub mod rate_limit;
pub mod revocation;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClaimSet, SubjectId},
		clock::{Clock, ManualClock},
		config::AuthConfig,
		directory::{ClaimsLookup, StaticDirectory},
		lifecycle::TokenManager,
		rate_limit::RateLimiter,
		revocation::RevocationRegistry,
		store::{KvStore, MemoryStore},
	};

	/// Signing secret shared by every test fixture.
	pub const TEST_SECRET: &str = "test-signing-secret-with-at-least-32-bytes";

	/// Fully wired test harness backed by an in-memory store and a manual clock.
	pub struct TestHarness {
		/// Manager under test.
		pub manager: TokenManager,
		/// Rate limiter sharing the same store and clock.
		pub limiter: RateLimiter,
		/// Backing store, exposed so tests can inspect keys directly.
		pub store: Arc<MemoryStore>,
		/// Clock driving token expiry, store TTLs, and rate windows.
		pub clock: Arc<ManualClock>,
		/// Mutable user directory answering claim lookups during refresh.
		pub directory: Arc<StaticDirectory>,
	}

	/// Builds a harness with the default [`AuthConfig`] lifetimes and policies.
	pub fn build_test_harness() -> TestHarness {
		let config = AuthConfig::new(TEST_SECRET);

		build_test_harness_with(config)
	}

	/// Builds a harness from the provided configuration.
	pub fn build_test_harness_with(config: AuthConfig) -> TestHarness {
		let clock = Arc::new(ManualClock::new(time::macros::datetime!(2025-06-01 12:00 UTC)));
		let dyn_clock: Arc<dyn Clock> = clock.clone();
		let store = Arc::new(MemoryStore::new(dyn_clock.clone()));
		let dyn_store: Arc<dyn KvStore> = store.clone();
		let directory = Arc::new(StaticDirectory::default());
		let lookup: Arc<dyn ClaimsLookup> = directory.clone();
		let registry = RevocationRegistry::new(dyn_store.clone());
		let manager = TokenManager::from_config(&config, registry, lookup, dyn_clock.clone())
			.expect("Test configuration should produce a token manager.");
		let limiter = RateLimiter::from_config(&config.rate_limit, dyn_store, dyn_clock);

		TestHarness { manager, limiter, store, clock, directory }
	}

	/// Convenience constructor for subject fixtures.
	pub fn subject(value: &str) -> SubjectId {
		SubjectId::new(value).expect("Subject fixture should be valid.")
	}

	/// Convenience constructor for claim fixtures holding only roles.
	pub fn roles<const N: usize>(values: [&str; N]) -> ClaimSet {
		ClaimSet::with_roles(values).expect("Role fixture should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, ErrorKind, Result};
}

pub use url;
