//! Bearer-token API client with wave-coalesced silent refresh - one refresh call per 401 storm,
//! FIFO replay of queued requests, durable session caches, and a swappable transport built for
//! testing.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod resources;
pub mod session;
pub mod store;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::{ApiClient, ReqwestApiClient},
		descriptor::ApiDescriptor,
		http::ReqwestTransport,
		store::{MemoryTokenStore, TokenStore},
	};

	/// Builds a reqwest transport with its own cookie jar, the way the production transport
	/// provisions one, for use against `httpmock` servers.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs an [`ApiClient`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_client(
		descriptor: ApiDescriptor,
	) -> (ReqwestApiClient, Arc<MemoryTokenStore>) {
		let store_backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let client = ApiClient::with_transport(store, descriptor, test_reqwest_transport());

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::{Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {bearer_broker as _, color_eyre as _, httpmock as _};
