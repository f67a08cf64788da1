#![cfg(feature = "test")]

// self
use session_guard::{
	_preludet::*,
	auth::{SignedToken, TokenId},
	config::{AuthConfig, FailurePolicy},
	lifecycle::RevocationTarget,
	revocation::revocation_key,
	store::KvStore,
};

fn payload_len(token: &SignedToken) -> usize {
	token.expose().split('.').nth(1).map_or(0, |payload| payload.len())
}

fn tamper_at(token: &SignedToken, index: usize) -> String {
	let segments = token.expose().split('.').collect::<Vec<_>>();
	let mut payload = segments[1].chars().collect::<Vec<_>>();

	payload[index] = if payload[index] == 'x' { 'y' } else { 'x' };

	format!("{}.{}.{}", segments[0], payload.into_iter().collect::<String>(), segments[2])
}

fn tamper(token: &SignedToken) -> String {
	tamper_at(token, payload_len(token) / 3)
}

#[tokio::test]
async fn issued_access_token_validates_with_its_claims() {
	let harness = build_test_harness();
	let alice = subject("alice");
	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	assert_ne!(pair.access_jti(), pair.refresh_jti());
	assert_eq!(pair.access_expires_at(), time::macros::datetime!(2025-06-01 13:00 UTC));
	assert_eq!(pair.refresh_expires_at(), time::macros::datetime!(2025-07-01 12:00 UTC));
	assert!(harness.store.is_empty());

	let grant = harness
		.manager
		.validate_access(pair.access_token.expose())
		.await
		.expect("Fresh access token should validate.");

	assert_eq!(grant.subject, alice);
	assert_eq!(&grant.jti, pair.access_jti());
	assert!(grant.claims.has_role("user"));
	assert_eq!(harness.manager.metrics.issued(), 1);
	assert_eq!(harness.manager.metrics.validated(), 1);
}

#[tokio::test]
async fn access_token_expires_after_its_lifetime() {
	let harness = build_test_harness();
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.clock.advance(Duration::minutes(59));

	assert!(harness.manager.validate_access(pair.access_token.expose()).await.is_ok());

	harness.clock.advance(Duration::minutes(1));

	let err = harness
		.manager
		.validate_access(pair.access_token.expose())
		.await
		.expect_err("Access token should be expired.");

	assert!(matches!(err, Error::Expired));
	assert_eq!(err.reason_code(), "token_expired");
}

#[tokio::test]
async fn tampered_token_fails_signature_check() {
	let harness = build_test_harness();
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	for index in 0..payload_len(&pair.access_token) {
		let err = harness
			.manager
			.validate_access(&tamper_at(&pair.access_token, index))
			.await
			.expect_err("Tampered token should be rejected.");

		assert!(
			matches!(err, Error::SignatureInvalid),
			"Changing payload character {index} should fail with a signature error, got {err:?}."
		);
	}

	assert!(harness.manager.validate_access(pair.access_token.expose()).await.is_ok());
}

#[tokio::test]
async fn revoked_token_is_rejected_and_entry_expires_with_the_token() {
	let harness = build_test_harness();
	let alice = subject("alice");
	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness
		.manager
		.revoke(pair.access_token.clone())
		.await
		.expect("Revoking a live token should succeed.");

	assert!(matches!(
		harness.manager.validate_access(pair.access_token.expose()).await,
		Err(Error::Revoked)
	));

	let key = revocation_key(pair.access_jti());

	assert_eq!(harness.store.ttl(&key).await, Ok(Some(Duration::hours(1))));
	assert_eq!(harness.manager.registry().owner(pair.access_jti()).await, Ok(Some(alice)));

	harness.clock.advance(Duration::hours(1));

	assert_eq!(harness.store.get(&key).await, Ok(None));
	assert!(matches!(
		harness.manager.validate_access(pair.access_token.expose()).await,
		Err(Error::Expired)
	));
	assert_eq!(harness.manager.metrics.revoked(), 1);
}

#[tokio::test]
async fn revoking_expired_tokens_writes_nothing() {
	let harness = build_test_harness();
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.clock.advance(Duration::hours(2));
	harness
		.manager
		.revoke(pair.access_token.clone())
		.await
		.expect("Revoking an expired token should be a no-op.");
	harness
		.manager
		.revoke_for(pair.refresh_jti(), &subject("alice"), Duration::ZERO)
		.await
		.expect("Non-positive TTL should be a no-op.");

	assert!(harness.store.is_empty());
	assert_eq!(harness.manager.metrics.revoked(), 0);
}

#[tokio::test]
async fn revocation_with_an_unrepresentable_lifetime_is_refused() {
	let harness = build_test_harness();
	let jti = TokenId::new("far-future").expect("Token id fixture should be valid.");
	let err = harness
		.manager
		.revoke_for(&jti, &subject("u1"), Duration::days(3_000_000))
		.await
		.expect_err("An expiry past the supported range should fail.");

	assert_eq!(err.kind(), ErrorKind::Internal);
	assert!(harness.store.is_empty());
	assert_eq!(harness.manager.metrics.revoked(), 0);
}

#[tokio::test]
async fn revoking_a_forged_token_is_refused() {
	let harness = build_test_harness();
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");
	let forged = SignedToken::new(tamper(&pair.access_token));

	assert!(matches!(harness.manager.revoke(forged).await, Err(Error::SignatureInvalid)));
	assert!(harness.store.is_empty());
}

#[tokio::test]
async fn explicit_revocation_targets_use_the_remaining_lifetime() {
	let harness = build_test_harness();
	let jti = TokenId::new("explicit-jti").expect("Token id fixture should be valid.");

	harness
		.manager
		.revoke(RevocationTarget::Id {
			jti: jti.clone(),
			subject: subject("bob"),
			expires_at: time::macros::datetime!(2025-06-01 12:10 UTC),
		})
		.await
		.expect("Explicit revocation should succeed.");

	assert_eq!(harness.manager.registry().is_revoked(&jti).await, Ok(true));
	assert_eq!(
		harness.store.ttl("revoked:explicit-jti").await,
		Ok(Some(Duration::minutes(10)))
	);
}

#[tokio::test]
async fn refresh_reflects_current_roles_without_rotation() {
	let harness = build_test_harness();
	let alice = subject("alice");

	harness.directory.set_roles(&alice, ["user"]).expect("Roles should be valid.");

	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.directory.set_roles(&alice, ["user", "admin"]).expect("Roles should be valid.");
	harness.clock.advance(Duration::minutes(90));

	let refreshed = harness
		.manager
		.refresh(pair.refresh_token.expose())
		.await
		.expect("Refresh should succeed.");

	assert_eq!(refreshed.expires_at, time::macros::datetime!(2025-06-01 14:30 UTC));

	let grant = harness
		.manager
		.validate_access(refreshed.access.expose())
		.await
		.expect("Refreshed access token should validate.");

	assert_eq!(grant.claims.roles.iter().collect::<Vec<_>>(), vec!["user", "admin"]);
	assert_eq!(grant.jti, refreshed.jti);

	// The same refresh token keeps working.
	let again = harness
		.manager
		.refresh(pair.refresh_token.expose())
		.await
		.expect("Refresh token should not be rotated.");

	assert_ne!(again.jti, refreshed.jti);
	assert_eq!(harness.manager.metrics.refreshed(), 2);
}

#[tokio::test]
async fn revoked_refresh_token_cannot_refresh() {
	let harness = build_test_harness();
	let alice = subject("alice");

	harness.directory.set_roles(&alice, ["user"]).expect("Roles should be valid.");

	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness
		.manager
		.revoke(pair.refresh_token.clone())
		.await
		.expect("Revoking the refresh token should succeed.");

	assert!(matches!(
		harness.manager.refresh(pair.refresh_token.expose()).await,
		Err(Error::Revoked)
	));
	assert_eq!(
		harness.store.ttl(&revocation_key(pair.refresh_jti())).await,
		Ok(Some(Duration::days(30)))
	);
}

#[tokio::test]
async fn registry_outage_fails_closed_by_default() {
	let harness = build_test_harness();
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.store.simulate_outage(true);

	let err = harness
		.manager
		.validate_access(pair.access_token.expose())
		.await
		.expect_err("Fail-closed validation should surface the outage.");

	assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
	assert_eq!(err.kind().http_status(), 503);
}

#[tokio::test]
async fn registry_outage_can_fail_open() {
	let harness = build_test_harness_with(
		AuthConfig::new(TEST_SECRET).with_revocation_failure_policy(FailurePolicy::FailOpen),
	);
	let pair = harness
		.manager
		.issue_tokens(&subject("alice"), &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.store.simulate_outage(true);

	assert!(harness.manager.validate_access(pair.access_token.expose()).await.is_ok());

	// Decoding still runs first, so forged tokens are refused even while the store is down.
	assert!(matches!(
		harness.manager.validate_access(&tamper(&pair.access_token)).await,
		Err(Error::SignatureInvalid)
	));
}

#[tokio::test]
async fn logout_revokes_the_presented_access_token() {
	let harness = build_test_harness();
	let alice = subject("alice");
	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness.manager.logout(pair.access_token.expose()).await.expect("Logout should succeed.");

	assert!(matches!(
		harness.manager.validate_access(pair.access_token.expose()).await,
		Err(Error::Revoked)
	));
	assert!(matches!(harness.manager.logout(pair.access_token.expose()).await, Err(Error::Revoked)));
}

#[tokio::test]
async fn logout_session_revokes_both_tokens() {
	let harness = build_test_harness();
	let alice = subject("alice");

	harness.directory.set_roles(&alice, ["user"]).expect("Roles should be valid.");

	let pair = harness
		.manager
		.issue_tokens(&alice, &roles(["user"]))
		.await
		.expect("Issuing a pair should succeed.");

	harness
		.manager
		.logout_session(&pair.access_token, &pair.refresh_token)
		.await
		.expect("Session logout should succeed.");

	assert!(matches!(
		harness.manager.validate_access(pair.access_token.expose()).await,
		Err(Error::Revoked)
	));
	assert!(matches!(
		harness.manager.refresh(pair.refresh_token.expose()).await,
		Err(Error::Revoked)
	));
	assert_eq!(harness.store.len(), 2);
}
