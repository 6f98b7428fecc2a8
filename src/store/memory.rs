//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
	token::SessionSnapshot,
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, SessionSnapshot>>>;

/// Thread-safe storage backend that keeps snapshots in-process.
///
/// Sessions stored here disappear with the process, which gives the
/// memory-only persistence policy.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(StoreMap);
impl MemoryTokenStore {
	fn save_now(map: StoreMap, key: StoreKey, snapshot: SessionSnapshot) -> Result<(), StoreError> {
		map.write().insert(key, snapshot);

		Ok(())
	}

	fn load_now(map: StoreMap, key: StoreKey) -> Option<SessionSnapshot> {
		map.read().get(&key).cloned()
	}

	fn clear_now(map: StoreMap, key: StoreKey) -> Result<(), StoreError> {
		map.write().remove(&key);

		Ok(())
	}
}
impl TokenStore for MemoryTokenStore {
	fn save<'a>(&'a self, key: &'a StoreKey, snapshot: SessionSnapshot) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Self::save_now(map, key, snapshot) })
	}

	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<SessionSnapshot>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, key)) })
	}

	fn clear<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Self::clear_now(map, key) })
	}
}
