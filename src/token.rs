//! Bearer token secret wrapper and the persisted session snapshot.

// self
use crate::_prelude::*;

/// Redacted bearer token keeping sensitive material out of logs.
///
/// The token is opaque to the client: expiry is learned from 401 responses,
/// never by inspecting the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Durable session snapshot written to a [`TokenStore`](crate::store::TokenStore).
///
/// Only the token and its save instant persist; the cached identity is
/// re-fetched on bootstrap so a stale profile never outlives its session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Access token to rehydrate from.
	pub access_token: AccessToken,
	/// Instant the snapshot was written.
	pub saved_at: OffsetDateTime,
}
impl SessionSnapshot {
	/// Builds a snapshot stamped with the current clock.
	pub fn new(access_token: AccessToken) -> Self {
		Self { access_token, saved_at: OffsetDateTime::now_utc() }
	}
}
impl Debug for SessionSnapshot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionSnapshot")
			.field("access_token", &"<redacted>")
			.field("saved_at", &self.saved_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_formatters_redact() {
		let token = AccessToken::new("super-secret");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
	}

	#[test]
	fn snapshot_debug_redacts_token() {
		let snapshot = SessionSnapshot::new(AccessToken::new("super-secret"));
		let rendered = format!("{snapshot:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("super-secret"));
	}
}
