//! Authenticated client owning the session state and the 401 retry protocol.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	descriptor::ApiDescriptor,
	http::{ApiResponse, HttpTransport, RequestDescriptor},
	obs::{self, OpKind, OpOutcome, OpSpan},
	refresh::{RefreshGate, RefreshMetrics},
	session::User,
	store::{StoreKey, TokenStore},
	token::{AccessToken, SessionSnapshot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Authenticated HTTP client with transparent access-token refresh.
///
/// The client owns the current access token, the cached identity, and the
/// refresh gate, so one value can serve an entire application the way a single
/// shared HTTP instance would. Clones share the same session: a token
/// installed through any clone is visible to all of them, and a refresh wave
/// triggered by one clone settles 401s observed by the others.
#[derive(Clone)]
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport executing every outbound wire request.
	pub transport: Arc<T>,
	/// Backend descriptor defining the base URL, auth routes, and refresh policy.
	pub descriptor: ApiDescriptor,
	/// Durable snapshot store used for session rehydration.
	pub store: Arc<dyn TokenStore>,
	pub(crate) state: Arc<SessionState>,
	pub(crate) gate: Arc<RefreshGate>,
	pub(crate) session_guard: Arc<AsyncMutex<()>>,
	store_key: StoreKey,
}

/// Shared mutable session cells behind the client's clones.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
	pub(crate) token: RwLock<Option<AccessToken>>,
	pub(crate) identity: RwLock<Option<User>>,
	pub(crate) ready: AtomicBool,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn TokenStore>,
		descriptor: ApiDescriptor,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let store_key = StoreKey::for_backend(&descriptor.base_url);

		Self {
			transport: transport.into(),
			descriptor,
			store,
			state: Default::default(),
			gate: Default::default(),
			session_guard: Default::default(),
			store_key,
		}
	}

	/// Returns the store key identifying this backend's snapshot.
	pub fn store_key(&self) -> &StoreKey {
		&self.store_key
	}

	/// Returns a copy of the current access token, if one is installed.
	pub fn access_token(&self) -> Option<AccessToken> {
		self.state.token.read().clone()
	}

	/// Returns the identity cached by the last login or bootstrap.
	pub fn current_user(&self) -> Option<User> {
		self.state.identity.read().clone()
	}

	/// Returns `true` once [`bootstrap`](Self::bootstrap) has settled the
	/// initial session state, successfully or not.
	pub fn is_ready(&self) -> bool {
		self.state.ready.load(Ordering::Acquire)
	}

	/// Returns `true` while a signed-in identity is cached.
	pub fn is_authenticated(&self) -> bool {
		self.state.identity.read().is_some()
	}

	/// Counters describing refresh gate activity.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.gate.metrics()
	}

	/// Installs or clears the access token, writing through to the store.
	///
	/// The in-memory token is authoritative for outbound requests; the store
	/// write makes the session durable for the next
	/// [`bootstrap`](Self::bootstrap). Re-installing the token already in
	/// place leaves the session in the same observable state.
	pub async fn set_access_token(&self, token: Option<AccessToken>) -> Result<()> {
		self.install_token(token.clone());

		match token {
			Some(token) => self.store.save(&self.store_key, SessionSnapshot::new(token)).await?,
			None => self.store.clear(&self.store_key).await?,
		}

		Ok(())
	}

	/// Executes a request with bearer injection and the 401 retry protocol.
	///
	/// Responses pass through with their status: a 404 or 500 comes back as
	/// `Ok` here, and only transport, configuration, or refresh failures
	/// produce `Err`. A 401 from a non-exempt path triggers one refresh wave
	/// and one replay carrying the token the wave delivered; the replay's
	/// outcome is final even when it is another 401.
	pub async fn request(&self, request: RequestDescriptor) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.request_inner(&request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn request_inner(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
		let token = self.access_token();
		let response = self.dispatch(request, token.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED
			|| self.descriptor.is_refresh_exempt(request.path())
		{
			return Ok(response);
		}

		let fresh = self.refresh_access_token().await?;

		self.dispatch(request, Some(&fresh)).await
	}

	async fn dispatch(
		&self,
		request: &RequestDescriptor,
		token: Option<&AccessToken>,
	) -> Result<ApiResponse> {
		let wire = request.resolve(&self.descriptor, token)?;

		Ok(ApiResponse::from_http(self.transport.execute(wire).await?))
	}

	pub(crate) fn install_token(&self, token: Option<AccessToken>) {
		*self.state.token.write() = token;
	}

	pub(crate) fn clear_local_session(&self) {
		self.state.token.write().take();
		self.state.identity.write().take();
	}

	pub(crate) async fn persist_token_advisory(&self, token: &AccessToken) {
		if let Err(e) =
			self.store.save(&self.store_key, SessionSnapshot::new(token.clone())).await
		{
			obs::record_store_degraded("save", &e);
		}
	}

	pub(crate) async fn erase_snapshot_advisory(&self) {
		if let Err(e) = self.store.clear(&self.store_key).await {
			obs::record_store_degraded("clear", &e);
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with the crate's default cookie-jar reqwest transport.
	///
	/// The transport provisions its own jar so the refresh credential set by
	/// the backend survives between calls. Use
	/// [`with_transport`](Self::with_transport) to supply a custom stack.
	pub fn new(store: Arc<dyn TokenStore>, descriptor: ApiDescriptor) -> Result<Self> {
		Ok(Self::with_transport(store, descriptor, ReqwestTransport::new()?))
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("descriptor", &self.descriptor)
			.field("authenticated", &self.is_authenticated())
			.field("ready", &self.is_ready())
			.finish()
	}
}
