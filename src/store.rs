//! Storage contracts and built-in backends for durable session snapshots.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, token::SessionSnapshot};

/// Persistence contract future for session snapshot stores.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by session token stores.
///
/// The client treats the store as a rehydration cache: the in-memory token is
/// authoritative, and the store only matters across process restarts.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the snapshot for the provided backend key.
	fn save<'a>(&'a self, key: &'a StoreKey, snapshot: SessionSnapshot) -> StoreFuture<'a, ()>;

	/// Fetches the snapshot associated with the backend key, if present.
	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<SessionSnapshot>>;

	/// Removes the snapshot for the backend key, if present.
	fn clear<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying the backend a snapshot belongs to.
///
/// Distinct backends sharing one store file must not read each other's
/// sessions, so the key is a digest of the normalized base URL rather than
/// the URL itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);
impl StoreKey {
	/// Builds a key by fingerprinting the backend base URL.
	///
	/// [`Url`] normalization (case-insensitive host, default-port stripping)
	/// happens before hashing, so equivalent spellings map to one key.
	pub fn for_backend(base_url: &Url) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(base_url.as_str().as_bytes());

		let digest = hasher.finalize();

		Self(STANDARD_NO_PAD.encode(digest))
	}

	/// Returns the fingerprint string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
