#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use bearer_broker::{
	_preludet::*,
	descriptor::ApiDescriptor,
	error::RefreshError,
	http::RequestDescriptor,
	store::TokenStore,
	token::AccessToken,
};

fn build_descriptor(server: &MockServer) -> ApiDescriptor {
	ApiDescriptor::builder(server.url("/api"))
		.build()
		.expect("Descriptor should build against the mock server.")
}

#[tokio::test]
async fn passthrough_keeps_non_401_statuses() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders");
			then.status(500)
				.header("content-type", "application/json")
				.body(r#"{"message":"storage offline"}"#);
		})
		.await;
	let response = client
		.request(RequestDescriptor::get("/orders"))
		.await
		.expect("Non-401 statuses should pass through as responses.");

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(response.error_message().as_deref(), Some("storage offline"));
	assert_eq!(client.refresh_metrics().attempts(), 0);
}

#[tokio::test]
async fn refresh_replays_with_the_delivered_token() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));

	client
		.set_access_token(Some(AccessToken::new("tok-stale")))
		.await
		.expect("Token install should succeed.");

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users").header("authorization", "Bearer tok-stale");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"tok-fresh"}"#);
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users").header("authorization", "Bearer tok-fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"items":[],"total":0,"totalPages":0,"page":1,"limit":10}"#);
		})
		.await;
	let response = client
		.request(RequestDescriptor::get("/users"))
		.await
		.expect("Replay should succeed after the refresh.");

	stale.assert_async().await;
	refresh.assert_async().await;
	fresh.assert_async().await;

	assert!(response.is_success());
	assert_eq!(client.access_token(), Some(AccessToken::new("tok-fresh")));

	let snapshot = client
		.store
		.load(client.store_key())
		.await
		.expect("Store load should succeed.")
		.expect("Refresh should persist a snapshot.");

	assert_eq!(snapshot.access_token, AccessToken::new("tok-fresh"));
}

#[tokio::test]
async fn second_401_passes_through_after_one_replay() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));

	client
		.set_access_token(Some(AccessToken::new("tok-a")))
		.await
		.expect("Token install should succeed.");

	let ping = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/ping");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"tok-b"}"#);
		})
		.await;
	let response = client
		.request(RequestDescriptor::get("/ping"))
		.await
		.expect("A second 401 should come back as a response, not an error.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	refresh.assert_calls_async(1).await;
	ping.assert_calls_async(2).await;
}

#[tokio::test]
async fn auth_routes_are_refresh_exempt() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"Invalid credentials"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"never-used"}"#);
		})
		.await;
	let response = client
		.request(RequestDescriptor::post("/auth/login"))
		.await
		.expect("An exempt 401 should pass through.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	login.assert_async().await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn definitive_refresh_failure_clears_the_session() {
	let server = MockServer::start_async().await;
	let (client, _) = build_reqwest_test_client(build_descriptor(&server));

	client
		.set_access_token(Some(AccessToken::new("tok-dead")))
		.await
		.expect("Token install should succeed.");

	let orders = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"session expired"}"#);
		})
		.await;
	let err = client
		.request(RequestDescriptor::get("/orders"))
		.await
		.expect_err("A failed refresh should reject the request.");

	orders.assert_calls_async(1).await;
	refresh.assert_async().await;

	assert!(matches!(
		&err,
		Error::Refresh(RefreshError::Rejected { status: 401, reason }) if reason == "session expired",
	));
	assert!(err.is_session_terminal());
	assert_eq!(client.access_token(), None);
	assert_eq!(
		client.store.load(client.store_key()).await.expect("Store load should succeed."),
		None,
	);
}
