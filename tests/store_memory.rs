#![cfg(feature = "test")]

// crates.io
use time::macros;
// self
use session_guard::{
	_preludet::*,
	clock::ManualClock,
	config::StoreConfig,
	store::{KvStore, MemoryStore, ResilientStore, StoreError},
};

fn store() -> (Arc<MemoryStore>, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::new(macros::datetime!(2025-11-10 12:00 UTC)));

	(Arc::new(MemoryStore::new(clock.clone())), clock)
}

#[tokio::test]
async fn memory_store_increments_are_linearizable() {
	let (store, _) = store();
	let tasks = (0..64)
		.map(|_| {
			let store = store.clone();

			tokio::spawn(async move { store.increment("counter", Duration::minutes(1)).await })
		})
		.collect::<Vec<_>>();
	let mut seen = Vec::new();

	for task in tasks {
		seen.push(
			task.await.expect("Task should not panic.").expect("Increment should succeed."),
		);
	}

	seen.sort_unstable();

	assert_eq!(seen, (1..=64).collect::<Vec<u64>>());
}

#[tokio::test]
async fn memory_store_overwrites_and_expires_values() {
	let (store, clock) = store();

	store
		.set_with_expiry("revoked:a", "alice", Duration::seconds(30))
		.await
		.expect("First write should succeed.");
	store
		.set_with_expiry("revoked:a", "bob", Duration::seconds(90))
		.await
		.expect("Overwrite should succeed.");

	assert_eq!(store.get("revoked:a").await, Ok(Some("bob".into())));

	clock.advance(Duration::seconds(60));

	assert_eq!(store.ttl("revoked:a").await, Ok(Some(Duration::seconds(30))));

	clock.advance(Duration::seconds(30));

	assert_eq!(store.exists("revoked:a").await, Ok(false));
	assert_eq!(store.ttl("revoked:a").await, Ok(None));
}

#[tokio::test]
async fn non_numeric_values_cannot_be_incremented() {
	let (store, _) = store();

	store
		.set_with_expiry("k", "not-a-number", Duration::seconds(5))
		.await
		.expect("Write should succeed.");

	assert!(matches!(
		store.increment("k", Duration::seconds(5)).await,
		Err(StoreError::Serialization { .. })
	));
}

#[tokio::test]
async fn resilient_store_surfaces_persistent_outages() {
	let (memory, _) = store();
	let config = StoreConfig { timeout_ms: 50, retry_backoff_ms: 1, ..Default::default() };
	let store = ResilientStore::from_config(memory.clone(), &config);

	memory.simulate_outage(true);

	assert!(matches!(store.exists("k").await, Err(StoreError::Unavailable { .. })));

	memory.simulate_outage(false);

	assert_eq!(store.exists("k").await, Ok(false));
	assert_eq!(store.increment("k", Duration::seconds(5)).await, Ok(1));
}
