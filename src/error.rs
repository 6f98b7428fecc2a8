//! Client-level error types shared across the request path, session ops, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response payload could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Token refresh failed and the session has been cleared.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Backend rejected the login credentials.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Backend- or client-supplied reason string.
		reason: String,
	},
	/// Backend answered a typed API call with a non-success status.
	#[error("Backend rejected the call with status {status}: {message}.")]
	Api {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Backend-supplied message, or a canned fallback.
		message: String,
	},
}
impl Error {
	/// Builds an [`Error::Authentication`] from any printable reason.
	pub fn authentication(reason: impl Into<String>) -> Self {
		Self::Authentication { reason: reason.into() }
	}

	/// Returns `true` when the session is gone and the caller should route the
	/// user back through login.
	pub fn is_session_terminal(&self) -> bool {
		matches!(self, Self::Refresh(_) | Self::Authentication { .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Base URL string could not be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than `http` or `https`.
	#[error("Base URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// Base URL cannot serve as a base for joining request paths.
	#[error("Base URL cannot be used as a base for request paths.")]
	BaseUrlNotABase,
	/// Base URL carries a query string or fragment.
	#[error("Base URL must not carry a query string or fragment.")]
	BaseUrlHasQueryOrFragment,
	/// Auth route does not start with `/`.
	#[error("Auth route `{path}` must be absolute (start with `/`).")]
	RelativeAuthRoute {
		/// Offending route value.
		path: String,
	},
	/// Refresh timeout must be a positive duration.
	#[error("Refresh timeout must be positive.")]
	NonPositiveRefreshTimeout,
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` could not be resolved against the base URL.")]
	InvalidRequestPath {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[from] serde_json::Error),
	/// Access token contains bytes that cannot appear in an HTTP header.
	#[error("Access token is not a valid header value.")]
	MalformedAccessToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
///
/// These never trigger the refresh protocol; they surface to the caller
/// unchanged so retry policy stays in the caller's hands.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
	/// The call exceeded its deadline before a response arrived.
	#[error("Request timed out in transit.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Refresh handshake failures.
///
/// The type is `Clone` because one refresh outcome settles an entire wave:
/// every queued request receives its own copy of the same rejection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint rejected the ambient session credential.
	#[error("Refresh endpoint rejected the session (status {status}): {reason}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Backend-supplied message, or a canned fallback.
		reason: String,
	},
	/// Transport failed while calling the refresh endpoint.
	#[error("Refresh call failed in transit: {message}.")]
	Transit {
		/// Rendered transport failure.
		message: String,
	},
	/// Refresh endpoint returned a payload the client could not decode.
	#[error("Refresh endpoint returned a malformed payload: {message}.")]
	Malformed {
		/// Rendered decode failure.
		message: String,
	},
	/// Refresh request could not be constructed from the descriptor.
	#[error("Refresh request could not be built: {message}.")]
	Build {
		/// Rendered construction failure.
		message: String,
	},
	/// The request leading the refresh was dropped before the handshake settled.
	#[error("Refresh was interrupted before completion.")]
	Interrupted,
}
impl RefreshError {
	/// Returns `true` when the backend itself ruled the session out.
	///
	/// Definitive rejections also erase the durable snapshot; transient
	/// failures keep it so a later bootstrap can try again.
	pub fn is_definitive(&self) -> bool {
		matches!(self, Self::Rejected { .. } | Self::Malformed { .. })
	}
}

/// Structured JSON decode failures for response payloads.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body is not valid JSON for the expected shape.
	#[error("Response payload is not valid JSON for {context}.")]
	Json {
		/// Label of the payload being decoded (e.g. `login response`).
		context: &'static str,
		/// Structured parsing failure carrying the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl DecodeError {
	/// Decodes `bytes` as JSON, labeling failures with `context`.
	pub fn decode_json<T>(context: &'static str, bytes: &[u8]) -> Result<T, Self>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Self::Json { context, source })
	}
}
