#![cfg(feature = "test")]

// self
use session_guard::{
	_preludet::*,
	config::{AuthConfig, FailurePolicy, RateLimitConfig},
	rate_limit::{ClientKey, window_key},
	store::KvStore,
};

fn client(value: &str) -> ClientKey {
	ClientKey::new(value).expect("Client key fixture should be valid.")
}

#[tokio::test]
async fn sixth_request_in_a_window_is_denied() {
	let harness = build_test_harness();
	let key = client("203.0.113.7:login");
	let window = Duration::seconds(60);

	for attempt in 1..=5 {
		assert_eq!(
			harness.limiter.allow(&key, 5, window).await.ok(),
			Some(true),
			"Attempt {attempt} should fit in the budget."
		);
	}

	assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(false));

	harness.clock.advance(Duration::seconds(60));

	assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(true));
}

#[tokio::test]
async fn denied_requests_still_count() {
	let harness = build_test_harness();
	let key = client("203.0.113.7:login");

	for _ in 0..7 {
		let _ = harness.limiter.check(&key, 5, Duration::seconds(60)).await;
	}

	// 2025-06-01 12:00 UTC is unix 1_748_779_200, window id 29_146_320.
	let counter = harness
		.store
		.get(&window_key(&key, 29_146_320))
		.await
		.expect("Counter read should succeed.");

	assert_eq!(counter.as_deref(), Some("7"));
}

#[tokio::test]
async fn burst_across_a_boundary_may_reach_twice_the_limit() {
	let harness = build_test_harness();
	let key = client("203.0.113.7:search");
	let window = Duration::seconds(60);

	harness.clock.advance(Duration::seconds(59));

	for _ in 0..5 {
		assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(true));
	}

	harness.clock.advance(Duration::seconds(1));

	for _ in 0..5 {
		assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(true));
	}

	assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(false));
}

#[tokio::test]
async fn clients_have_independent_budgets() {
	let harness = build_test_harness();
	let window = Duration::seconds(60);

	assert_eq!(harness.limiter.allow(&client("10.0.0.1:login"), 1, window).await.ok(), Some(true));
	assert_eq!(harness.limiter.allow(&client("10.0.0.1:login"), 1, window).await.ok(), Some(false));
	assert_eq!(harness.limiter.allow(&client("10.0.0.2:login"), 1, window).await.ok(), Some(true));
	assert_eq!(harness.limiter.allow(&client("10.0.0.1:search"), 1, window).await.ok(), Some(true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_at_the_last_slot_admit_exactly_one() {
	let harness = build_test_harness();
	let window = Duration::seconds(60);

	for round in 0..32 {
		let key = client(&format!("198.51.100.{round}:login"));

		for _ in 0..4 {
			assert_eq!(harness.limiter.allow(&key, 5, window).await.ok(), Some(true));
		}

		let barrier = Arc::new(tokio::sync::Barrier::new(2));
		let tasks = (0..2)
			.map(|_| {
				let limiter = harness.limiter.clone();
				let key = key.clone();
				let barrier = barrier.clone();

				tokio::spawn(async move {
					barrier.wait().await;

					limiter.allow(&key, 5, window).await
				})
			})
			.collect::<Vec<_>>();
		let mut admitted = 0;

		for task in tasks {
			if task.await.expect("Task should not panic.").expect("Check should succeed.") {
				admitted += 1;
			}
		}

		assert_eq!(admitted, 1, "Round {round} should admit exactly one request.");
	}
}

#[tokio::test]
async fn default_policy_comes_from_configuration() {
	let harness = build_test_harness_with(AuthConfig::new(TEST_SECRET).with_rate_limit(
		RateLimitConfig { limit: 2, window_secs: 10, ..Default::default() },
	));
	let key = client("192.0.2.1:api");

	assert_eq!(harness.limiter.allow_default(&key).await.ok(), Some(true));
	assert_eq!(harness.limiter.allow_default(&key).await.ok(), Some(true));

	let denied = harness.limiter.check_default(&key).await.expect("Check should succeed.");

	assert!(!denied.allowed);
	assert_eq!(denied.window_seconds, 10);
	assert_eq!(denied.reset_at, time::macros::datetime!(2025-06-01 12:00:10 UTC));

	harness.clock.advance(Duration::seconds(10));

	assert_eq!(harness.limiter.allow_default(&key).await.ok(), Some(true));
}

#[tokio::test]
async fn store_outage_fails_open_by_default() {
	let harness = build_test_harness();
	let key = client("192.0.2.1:api");

	harness.store.simulate_outage(true);

	assert_eq!(harness.limiter.allow(&key, 1, Duration::seconds(60)).await.ok(), Some(true));
	assert_eq!(harness.limiter.allow(&key, 1, Duration::seconds(60)).await.ok(), Some(true));
}

#[tokio::test]
async fn store_outage_can_fail_closed() {
	let harness = build_test_harness_with(AuthConfig::new(TEST_SECRET).with_rate_limit(
		RateLimitConfig { failure_policy: FailurePolicy::FailClosed, ..Default::default() },
	));

	harness.store.simulate_outage(true);

	let err = harness
		.limiter
		.allow_default(&client("192.0.2.1:api"))
		.await
		.expect_err("Fail-closed limiter should surface the outage.");

	assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
}
