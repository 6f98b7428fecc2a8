//! Demonstrates driving the client through a hand-rolled [`HttpTransport`].
//!
//! 1. Implement [`HttpTransport`] over whatever stack executes the call; every HTTP status comes
//!    back as `Ok`, and only genuine transport failures map to `Err`.
//! 2. Hand the transport to [`ApiClient::with_transport`]; bearer injection, the 401 protocol,
//!    and the refresh gate keep working unchanged on top of it.

// std
use std::sync::{
	Arc,
	atomic::{AtomicU32, Ordering},
};
// crates.io
use color_eyre::Result;
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

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
	let descriptor = ApiDescriptor::builder("http://backend.test/api").build()?;
	let client = ApiClient::with_transport(store, descriptor, ScriptedTransport::default());

	client.set_access_token(Some(AccessToken::new("demo-expired"))).await?;

	let response =
		client.request(RequestDescriptor::get("/orders/recent").query("limit", 5)).await?;

	println!("Scripted backend answered with status {}.", response.status());
	println!(
		"The expired token was refreshed behind the call: {} wave, {} wire calls to the refresh route.",
		client.refresh_metrics().attempts(),
		client.transport.refresh_calls.load(Ordering::SeqCst),
	);

	let failing = ApiClient::with_transport(
		Arc::new(MemoryTokenStore::default()) as Arc<dyn TokenStore>,
		ApiDescriptor::builder("http://backend.test/api").build()?,
		OfflineTransport,
	);

	match failing.request(RequestDescriptor::get("/orders")).await {
		Ok(_) => println!("Offline transport unexpectedly produced a response."),
		Err(Error::Transport(TransportError::Timeout)) => println!(
			"Transport failures surface unchanged and never trigger a refresh: {} waves.",
			failing.refresh_metrics().attempts(),
		),
		Err(e) => println!("Unexpected error kind: {e}."),
	}

	Ok(())
}

/// Serves a canned conversation: a 401 for the expired token, a token grant on the refresh route,
/// and a page of orders once the fresh token shows up.
#[derive(Debug, Default)]
struct ScriptedTransport {
	refresh_calls: AtomicU32,
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			if request.uri().path().ends_with("/auth/refresh") {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				return Ok(json_response(StatusCode::OK, r#"{"accessToken":"demo-fresh"}"#));
			}

			let authorized =
				request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok())
					== Some("Bearer demo-fresh");

			if authorized {
				Ok(json_response(
					StatusCode::OK,
					r#"[{"_id":"o-1","total":129.9,"currency":"TRY","status":"completed"}]"#,
				))
			} else {
				Ok(json_response(StatusCode::UNAUTHORIZED, r#"{"message":"jwt expired"}"#))
			}
		})
	}
}

/// Fails every call the way a dead network would.
#[derive(Debug)]
struct OfflineTransport;
impl HttpTransport for OfflineTransport {
	fn execute(&self, _: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async { Err(TransportError::Timeout) })
	}
}

fn json_response(status: StatusCode, body: &str) -> HttpResponse {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = status;

	response
}
