#![cfg(feature = "reqwest")]

// std
use std::time::{Duration as StdDuration, Instant};
// crates.io
use httpmock::prelude::*;
// self
use bearer_broker::{
	_preludet::*, descriptor::ApiDescriptor, error::RefreshError, http::RequestDescriptor,
	store::TokenStore, token::AccessToken,
};

fn build_descriptor(server: &MockServer) -> ApiDescriptor {
	ApiDescriptor::builder(server.url("/api"))
		.build()
		.expect("Descriptor should build against the mock server.")
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh_wave() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));

	client
		.set_access_token(Some(AccessToken::new("tok-old")))
		.await
		.expect("Token install should succeed.");

	let orders_stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders").header("authorization", "Bearer tok-old");
			then.status(401);
		})
		.await;
	let users_stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users").header("authorization", "Bearer tok-old");
			then.status(401);
		})
		.await;
	// The delay keeps the wave open long enough for the second 401 to join it.
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.delay(StdDuration::from_millis(200))
				.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"tok-new"}"#);
		})
		.await;
	let orders_fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders").header("authorization", "Bearer tok-new");
			then.status(200).header("content-type", "application/json").body(r#"{"ok":true}"#);
		})
		.await;
	let users_fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users").header("authorization", "Bearer tok-new");
			then.status(200).header("content-type", "application/json").body(r#"{"ok":true}"#);
		})
		.await;
	let (orders, users) = tokio::join!(
		client.request(RequestDescriptor::get("/orders")),
		client.request(RequestDescriptor::get("/users")),
	);
	let orders = orders.expect("Queued orders request should be replayed successfully.");
	let users = users.expect("Queued users request should be replayed successfully.");

	assert!(orders.is_success());
	assert!(users.is_success());

	orders_stale.assert_async().await;
	users_stale.assert_async().await;
	refresh.assert_calls_async(1).await;
	orders_fresh.assert_async().await;
	users_fresh.assert_async().await;

	assert_eq!(client.access_token(), Some(AccessToken::new("tok-new")));
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().coalesced_waiters(), 1);
	assert_eq!(client.refresh_metrics().successes(), 1);
}

#[tokio::test]
async fn failed_wave_delivers_the_same_rejection_to_every_member() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));

	client
		.set_access_token(Some(AccessToken::new("tok-old")))
		.await
		.expect("Token install should succeed.");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.delay(StdDuration::from_millis(200))
				.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"session expired"}"#);
		})
		.await;
	let (orders, users) = tokio::join!(
		client.request(RequestDescriptor::get("/orders")),
		client.request(RequestDescriptor::get("/users")),
	);
	let orders = match orders.expect_err("First queued request should be rejected.") {
		Error::Refresh(e) => e,
		other => panic!("Unexpected error kind: {other:?}."),
	};
	let users = match users.expect_err("Second queued request should be rejected.") {
		Error::Refresh(e) => e,
		other => panic!("Unexpected error kind: {other:?}."),
	};

	refresh.assert_calls_async(1).await;

	assert_eq!(orders, users);
	assert!(matches!(orders, RefreshError::Rejected { status: 401, .. }));
	assert_eq!(client.access_token(), None);
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().coalesced_waiters(), 1);
	assert_eq!(client.refresh_metrics().failures(), 1);
}

#[tokio::test]
async fn stalled_refresh_times_out_at_the_deadline_and_keeps_the_snapshot() {
	let server = MockServer::start_async().await;
	let descriptor = ApiDescriptor::builder(server.url("/api"))
		.refresh_timeout(Duration::milliseconds(300))
		.build()
		.expect("Descriptor should build against the mock server.");
	let (client, _) = build_reqwest_test_client(descriptor);

	client
		.set_access_token(Some(AccessToken::new("tok-old")))
		.await
		.expect("Token install should succeed.");

	let orders_stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders").header("authorization", "Bearer tok-old");
			then.status(401);
		})
		.await;
	// The backend stalls well past the 300 ms deadline; this reply never lands.
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.delay(StdDuration::from_secs(3))
				.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"tok-new"}"#);
		})
		.await;
	let started = Instant::now();
	let err = client
		.request(RequestDescriptor::get("/orders"))
		.await
		.expect_err("The wave should be rejected when the refresh call times out.");

	assert!(started.elapsed() < StdDuration::from_secs(2));
	assert!(matches!(&err, Error::Refresh(RefreshError::Transit { .. })));

	orders_stale.assert_async().await;
	refresh.assert_async().await;

	assert_eq!(client.access_token(), None);
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().failures(), 1);

	let snapshot = client
		.store
		.load(client.store_key())
		.await
		.expect("Snapshot load should succeed.")
		.expect("A transient refresh failure should keep the stored snapshot.");

	assert_eq!(snapshot.access_token, AccessToken::new("tok-old"));
}
