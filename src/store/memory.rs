//! Thread-safe in-memory [`KvStore`] implementation for local development and tests.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{KvStore, StoreError, StoreFuture, ttl_millis},
};

#[derive(Clone, Debug)]
struct Entry {
	value: String,
	expires_at: Option<OffsetDateTime>,
}
impl Entry {
	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|instant| now < instant)
	}
}

#[derive(Debug, Default)]
struct State {
	entries: HashMap<String, Entry>,
	next_sweep: Option<OffsetDateTime>,
}
impl State {
	// Drops expired entries at most once per `SWEEP_INTERVAL` of clock time.
	fn sweep(&mut self, now: OffsetDateTime) {
		if self.next_sweep.is_some_and(|instant| now < instant) {
			return;
		}

		self.entries.retain(|_, entry| entry.is_live(now));
		self.next_sweep = now.checked_add(SWEEP_INTERVAL);
	}
}

const SWEEP_INTERVAL: Duration = Duration::seconds(30);

/// In-process store that honours expiries against an injectable [`Clock`].
///
/// A single mutex serializes every operation, which makes increments linearizable the same way
/// a single Redis node does. Expired entries are dropped on access, and every call sweeps the
/// whole map once at least 30 seconds of clock time have passed since the previous sweep, so
/// counters of past rate-limit windows do not accumulate.
#[derive(Clone)]
pub struct MemoryStore {
	state: Arc<Mutex<State>>,
	clock: Arc<dyn Clock>,
	offline: Arc<AtomicBool>,
}
impl MemoryStore {
	/// Creates an empty store driven by the provided clock.
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { state: Default::default(), clock, offline: Default::default() }
	}

	/// Makes every subsequent call fail with [`StoreError::Unavailable`] until reset.
	pub fn simulate_outage(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		let now = self.clock.now();

		self.state.lock().entries.values().filter(|entry| entry.is_live(now)).count()
	}

	/// Returns `true` if no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of stored entries, including expired ones not yet swept.
	pub fn allocated(&self) -> usize {
		self.state.lock().entries.len()
	}

	/// Drops every expired entry now and returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let now = self.clock.now();
		let mut state = self.state.lock();
		let before = state.entries.len();

		state.next_sweep = None;
		state.sweep(now);

		before - state.entries.len()
	}

	fn ensure_online(&self) -> Result<(), StoreError> {
		if self.offline.load(Ordering::SeqCst) {
			Err(StoreError::Unavailable { message: "simulated outage".into() })
		} else {
			Ok(())
		}
	}

	fn live_entry(&self, key: &str) -> Result<Option<Entry>, StoreError> {
		self.ensure_online()?;

		let now = self.clock.now();
		let mut state = self.state.lock();

		state.sweep(now);

		match state.entries.get(key) {
			Some(entry) if entry.is_live(now) => Ok(Some(entry.clone())),
			Some(_) => {
				state.entries.remove(key);

				Ok(None)
			},
			None => Ok(None),
		}
	}

	fn increment_now(&self, key: &str, ttl_if_created: Duration) -> Result<u64, StoreError> {
		self.ensure_online()?;

		let now = self.clock.now();
		let expires_at = expiry(now, ttl_if_created)?;
		let mut state = self.state.lock();

		state.sweep(now);

		let current = match state.entries.get(key) {
			Some(entry) if entry.is_live(now) => Some(entry.value.parse::<u64>().map_err(|e| {
				StoreError::Serialization { message: format!("Counter `{key}` is not an integer: {e}") }
			})?),
			_ => None,
		};
		let next = match current {
			Some(count) => {
				let next = count.checked_add(1).ok_or_else(|| StoreError::Serialization {
					message: format!("Counter `{key}` overflowed"),
				})?;

				if let Some(entry) = state.entries.get_mut(key) {
					entry.value = next.to_string();
				}

				next
			},
			None => {
				state
					.entries
					.insert(key.to_owned(), Entry { value: "1".into(), expires_at: Some(expires_at) });

				1
			},
		};

		Ok(next)
	}

	fn set_now(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
		self.ensure_online()?;

		let now = self.clock.now();
		let expires_at = expiry(now, ttl)?;
		let mut state = self.state.lock();

		state.sweep(now);
		state
			.entries
			.insert(key.to_owned(), Entry { value: value.to_owned(), expires_at: Some(expires_at) });

		Ok(())
	}
}
impl Debug for MemoryStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryStore")
			.field("entries", &self.state.lock().entries.len())
			.field("offline", &self.offline.load(Ordering::SeqCst))
			.finish()
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::new(Arc::new(SystemClock))
	}
}

fn expiry(now: OffsetDateTime, ttl: Duration) -> Result<OffsetDateTime, StoreError> {
	let millis = i64::try_from(ttl_millis(ttl)?).map_err(|_| StoreError::TtlOutOfRange)?;

	now.checked_add(Duration::milliseconds(millis)).ok_or(StoreError::TtlOutOfRange)
}

impl KvStore for MemoryStore {
	fn increment<'a>(&'a self, key: &'a str, ttl_if_created: Duration) -> StoreFuture<'a, u64> {
		Box::pin(async move { self.increment_now(key, ttl_if_created) })
	}

	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		value: &'a str,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.set_now(key, value, ttl) })
	}

	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.live_entry(key)?.map(|entry| entry.value)) })
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.live_entry(key)?.is_some()) })
	}

	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
		Box::pin(async move {
			let now = self.clock.now();

			Ok(self.live_entry(key)?.and_then(|entry| entry.expires_at).map(|instant| instant - now))
		})
	}
}
