// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use http::{StatusCode, header::AUTHORIZATION};
// self
use bearer_broker::{
	client::ApiClient,
	descriptor::ApiDescriptor,
	error::{Error, TransportError},
	http::{HttpRequest, HttpResponse, HttpTransport, RequestDescriptor, TransportFuture},
	store::{MemoryTokenStore, TokenStore},
	token::AccessToken,
};

fn json_response(status: StatusCode, body: &str) -> HttpResponse {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = status;

	response
}

fn build_client<T>(transport: T) -> ApiClient<T>
where
	T: HttpTransport,
{
	let descriptor =
		ApiDescriptor::builder("http://backend.test/api").build().expect("Descriptor should build.");
	let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());

	ApiClient::with_transport(store, descriptor, transport)
}

/// Bounces the stale token with 401s and stalls the refresh until both callers
/// have been bounced, so the wave provably forms before it settles.
#[derive(Debug, Default)]
struct LockstepTransport {
	refresh_calls: AtomicU32,
	bounced: AtomicU32,
}
impl HttpTransport for LockstepTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			if request.uri().path().ends_with("/auth/refresh") {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				while self.bounced.load(Ordering::SeqCst) < 2 {
					tokio::time::sleep(StdDuration::from_millis(5)).await;
				}

				return Ok(json_response(StatusCode::OK, r#"{"accessToken":"tok-fresh"}"#));
			}

			let bearer = request
				.headers()
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.unwrap_or_default()
				.to_owned();

			if bearer == "Bearer tok-fresh" {
				Ok(json_response(StatusCode::OK, r#"{"ok":true}"#))
			} else {
				self.bounced.fetch_add(1, Ordering::SeqCst);

				Ok(json_response(StatusCode::UNAUTHORIZED, r#"{"message":"jwt expired"}"#))
			}
		})
	}
}

#[derive(Debug)]
struct TimeoutTransport;
impl HttpTransport for TimeoutTransport {
	fn execute(&self, _: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async { Err(TransportError::Timeout) })
	}
}

#[tokio::test]
async fn wave_coalesces_behind_a_custom_transport() {
	let client = build_client(LockstepTransport::default());

	client
		.set_access_token(Some(AccessToken::new("tok-stale")))
		.await
		.expect("Token install should succeed.");

	let (orders, users) = tokio::join!(
		client.request(RequestDescriptor::get("/orders")),
		client.request(RequestDescriptor::get("/users")),
	);
	let orders = orders.expect("First request should settle after the wave.");
	let users = users.expect("Second request should settle after the wave.");

	assert_eq!(orders.status(), StatusCode::OK);
	assert_eq!(users.status(), StatusCode::OK);
	assert_eq!(client.transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().coalesced_waiters(), 1);
	assert_eq!(client.access_token(), Some(AccessToken::new("tok-fresh")));
}

#[tokio::test]
async fn transport_failures_bypass_the_refresh_protocol() {
	let client = build_client(TimeoutTransport);

	client
		.set_access_token(Some(AccessToken::new("tok-live")))
		.await
		.expect("Token install should succeed.");

	let err = client
		.request(RequestDescriptor::get("/orders"))
		.await
		.expect_err("A timed-out call should surface as an error.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout)));
	assert_eq!(client.refresh_metrics().attempts(), 0);
	assert_eq!(client.access_token(), Some(AccessToken::new("tok-live")));
}

#[tokio::test]
async fn set_access_token_writes_through_and_clears() {
	let client = build_client(TimeoutTransport);

	client
		.set_access_token(Some(AccessToken::new("tok-1")))
		.await
		.expect("Token install should succeed.");

	let snapshot = client
		.store
		.load(client.store_key())
		.await
		.expect("Store load should succeed.")
		.expect("Installing a token should persist a snapshot.");

	assert_eq!(snapshot.access_token, AccessToken::new("tok-1"));

	client.set_access_token(None).await.expect("Token clear should succeed.");

	assert_eq!(client.access_token(), None);
	assert_eq!(
		client.store.load(client.store_key()).await.expect("Store load should succeed."),
		None,
	);

	// Clearing an already-empty session stays a no-op.
	client.set_access_token(None).await.expect("Clearing an absent token should succeed.");

	assert_eq!(client.access_token(), None);
}
