//! Transport primitives for the authenticated request path.
//!
//! The module exposes [`HttpTransport`] as the client's only dependency on an
//! HTTP stack, [`RequestDescriptor`] for describing calls against the backend,
//! and [`ApiResponse`] for status-passthrough handling. The default
//! [`ReqwestTransport`] keeps a cookie jar so the backend's refresh credential
//! rides along with every call the way a browser session would.

// std
use std::time::Duration as StdDuration;
// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	descriptor::ApiDescriptor,
	error::{ConfigError, DecodeError, TransportError},
	token::AccessToken,
};

/// Wire request consumed by [`HttpTransport`] implementations.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Wire response produced by [`HttpTransport`] implementations.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Transport contract future resolving to a raw response.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing backend calls.
///
/// Implementations must return every HTTP status as `Ok`; only genuine
/// transport failures (connect, TLS, timeout, body read) map to `Err`. The
/// client relies on that split: statuses drive the 401 protocol, transport
/// errors never do.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes one wire request, returning the raw response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Per-request deadline honored by transports, attached via request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestDeadline(pub StdDuration);

/// Describes one call against the backend before the client resolves it onto
/// the wire.
///
/// Descriptors are reusable: resolving borrows them, so the client can replay
/// the same descriptor with a fresh token after a refresh.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	timeout: Option<Duration>,
}
impl RequestDescriptor {
	/// Starts a descriptor for the provided method and backend-relative path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			timeout: None,
		}
	}

	/// Starts a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Starts a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Starts a `PATCH` descriptor.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Starts a `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Inserts a header, replacing any previous value under the same name.
	pub fn header<N, V>(mut self, name: N, value: V) -> Result<Self, ConfigError>
	where
		HeaderName: TryFrom<N>,
		<HeaderName as TryFrom<N>>::Error: Into<http::Error>,
		HeaderValue: TryFrom<V>,
		<HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
	{
		let name = HeaderName::try_from(name).map_err(Into::into)?;
		let value = HeaderValue::try_from(value).map_err(Into::into)?;

		self.headers.insert(name, value);

		Ok(self)
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: Serialize,
	{
		self.body = Some(serde_json::to_vec(body)?);

		Ok(self)
	}

	/// Overrides the transport deadline for this call.
	///
	/// Negative durations clamp to a zero deadline, which times out
	/// immediately.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns the HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Returns the backend-relative path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Resolves the descriptor into a wire request against `api`, attaching
	/// the bearer token when one is supplied.
	pub(crate) fn resolve(
		&self,
		api: &ApiDescriptor,
		token: Option<&AccessToken>,
	) -> Result<HttpRequest, ConfigError> {
		let mut url = api.endpoint(&self.path)?;

		if !self.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &self.query {
				pairs.append_pair(key, value);
			}
		}

		let mut builder = http::Request::builder().method(self.method.clone()).uri(url.as_str());

		if let Some(headers) = builder.headers_mut() {
			headers.extend(self.headers.clone());

			if let Some(token) = token {
				headers.insert(AUTHORIZATION, bearer_value(token)?);
			}
			if self.body.is_some() {
				headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
			}
		}

		let mut request = builder.body(self.body.clone().unwrap_or_default())?;

		if let Some(timeout) = self.timeout {
			let deadline = timeout.max(Duration::ZERO).unsigned_abs();

			request.extensions_mut().insert(RequestDeadline(deadline));
		}

		Ok(request)
	}
}

/// Raw backend response with status passthrough and JSON decoding helpers.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Wraps a wire response.
	pub fn from_http(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}

	/// Returns the HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Returns the response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Returns the raw body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, labeling failures with `context`.
	pub fn json<T>(&self, context: &'static str) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		DecodeError::decode_json(context, &self.body)
	}

	/// Extracts the backend's `{"message": …}` error payload, if present.
	pub fn error_message(&self) -> Option<String> {
		let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;

		value.get("message").and_then(|m| m.as_str()).map(str::to_owned)
	}

	/// Converts non-success statuses into [`Error::Api`], passing 2xx through.
	pub fn require_success(self) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::Api {
				status: self.status.as_u16(),
				message: self
					.error_message()
					.unwrap_or_else(|| "backend returned no error message".into()),
			})
		}
	}
}

pub(crate) fn bearer_value(token: &AccessToken) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
		.map_err(|_| ConfigError::MalformedAccessToken)?;

	value.set_sensitive(true);

	Ok(value)
}

/// Default transport backed by [`ReqwestClient`].
///
/// The jar-enabled constructor matters: the backend issues its refresh
/// credential as an HTTP-only cookie, so the transport must persist and replay
/// cookies for `POST <refresh>` to ever succeed.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with an ambient cookie jar.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self(ReqwestClient::builder().cookie_store(true).build()?))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// Callers supplying their own client must enable a cookie store, or the
	/// refresh credential will be dropped between calls.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let deadline = request.extensions().get::<RequestDeadline>().copied();
			let mut request: reqwest::Request = request.try_into().map_err(TransportError::from)?;

			if let Some(RequestDeadline(timeout)) = deadline {
				*request.timeout_mut() = Some(timeout);
			}

			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut wire = HttpResponse::new(response.bytes().await?.to_vec());

			*wire.status_mut() = status;
			*wire.headers_mut() = headers;

			Ok(wire)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::descriptor::ApiDescriptor;

	fn api() -> ApiDescriptor {
		ApiDescriptor::builder("http://localhost:5000/api")
			.build()
			.expect("Descriptor fixture should validate.")
	}

	#[test]
	fn resolve_attaches_bearer_and_content_type() {
		let token = AccessToken::new("tok-1");
		let request = RequestDescriptor::post("/products")
			.json(&serde_json::json!({ "name": "Desk" }))
			.expect("JSON body should serialize.")
			.resolve(&api(), Some(&token))
			.expect("Descriptor should resolve onto the wire.");

		assert_eq!(request.uri(), "http://localhost:5000/api/products");
		assert_eq!(
			request.headers().get(AUTHORIZATION).map(|v| v.to_str().ok()),
			Some(Some("Bearer tok-1")),
		);
		assert_eq!(
			request.headers().get(CONTENT_TYPE).map(|v| v.to_str().ok()),
			Some(Some("application/json")),
		);
	}

	#[test]
	fn resolve_appends_query_pairs_and_deadline() {
		let request = RequestDescriptor::get("/orders")
			.query("page", 2)
			.query("status", "pending")
			.timeout(Duration::seconds(5))
			.resolve(&api(), None)
			.expect("Descriptor should resolve onto the wire.");

		assert_eq!(request.uri(), "http://localhost:5000/api/orders?page=2&status=pending");
		assert!(request.headers().get(AUTHORIZATION).is_none());
		assert_eq!(
			request.extensions().get::<RequestDeadline>(),
			Some(&RequestDeadline(StdDuration::from_secs(5))),
		);
	}

	#[test]
	fn resolve_clamps_negative_deadlines_to_zero() {
		let request = RequestDescriptor::get("/orders")
			.timeout(Duration::seconds(-5))
			.resolve(&api(), None)
			.expect("Descriptor should resolve onto the wire.");

		assert_eq!(
			request.extensions().get::<RequestDeadline>(),
			Some(&RequestDeadline(StdDuration::ZERO)),
		);
	}

	#[test]
	fn resolve_rejects_tokens_that_cannot_be_headers() {
		let token = AccessToken::new("tok\nen");
		let outcome = RequestDescriptor::get("/users").resolve(&api(), Some(&token));

		assert!(matches!(outcome, Err(ConfigError::MalformedAccessToken)));
	}

	#[test]
	fn require_success_surfaces_backend_messages() {
		let mut response = HttpResponse::new(br#"{"message":"Product not found"}"#.to_vec());

		*response.status_mut() = StatusCode::NOT_FOUND;

		let err = ApiResponse::from_http(response)
			.require_success()
			.expect_err("Non-success statuses should convert to errors.");

		assert!(matches!(
			err,
			Error::Api { status: 404, ref message } if message == "Product not found",
		));
	}

	#[test]
	fn error_message_tolerates_non_json_bodies() {
		let response = ApiResponse::from_http(HttpResponse::new(b"<html>boom</html>".to_vec()));

		assert_eq!(response.error_message(), None);
	}
}
