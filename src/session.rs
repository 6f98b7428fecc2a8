//! Session lifecycle: credential exchange, teardown, and startup rehydration.

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{HttpTransport, RequestDescriptor},
	obs::{self, OpKind, OpOutcome, OpSpan},
	token::{AccessToken, SessionSnapshot},
};

/// Identity document returned by the backend's auth and identity routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Backend identifier.
	#[serde(rename = "_id")]
	pub id: String,
	/// Display name.
	pub name: String,
	/// Login email.
	pub email: String,
	/// Authorization role.
	pub role: UserRole,
	/// Creation timestamp, when the backend includes one.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// Authorization role attached to a [`User`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
	/// Full administrative access.
	Admin,
	/// Management access without user administration.
	Manager,
	/// Regular signed-in user.
	User,
}
impl UserRole {
	/// Returns the lowercase wire label for the role.
	pub const fn as_str(self) -> &'static str {
		match self {
			UserRole::Admin => "admin",
			UserRole::Manager => "manager",
			UserRole::User => "user",
		}
	}
}
impl Display for UserRole {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Wire payload carrying a granted access token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenGrant {
	pub access_token: String,
	#[serde(default)]
	pub user: Option<User>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
	email: &'a str,
	password: &'a str,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges credentials for a session.
	///
	/// On success the granted token is installed, the identity is cached, and
	/// the session snapshot is written through to the store. A rejected login
	/// surfaces as [`Error::Authentication`] carrying the backend's message.
	pub async fn login(&self, email: &str, password: &str) -> Result<User> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.login_inner(email, password)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn login_inner(&self, email: &str, password: &str) -> Result<User> {
		let _serial = self.session_guard.lock().await;
		let request = RequestDescriptor::post(self.descriptor.auth_routes.login.clone())
			.json(&LoginRequest { email, password })?;
		let response = self.request(request).await?;

		if !response.is_success() {
			return Err(Error::authentication(
				response.error_message().unwrap_or_else(|| "login rejected".into()),
			));
		}

		let grant = response.json::<TokenGrant>("login response")?;
		let user = grant
			.user
			.ok_or_else(|| Error::authentication("login response did not include a user"))?;
		let token = AccessToken::new(grant.access_token);

		self.install_token(Some(token.clone()));
		self.state.identity.write().replace(user.clone());
		self.store.save(self.store_key(), SessionSnapshot::new(token)).await?;

		Ok(user)
	}

	/// Ends the session locally and, best effort, on the backend.
	///
	/// The wire call's outcome is ignored: whatever the backend says, the
	/// local token, identity, and durable snapshot are gone when this returns.
	pub async fn logout(&self) {
		const KIND: OpKind = OpKind::Logout;

		let span = OpSpan::new(KIND, "logout");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		span.instrument(self.logout_inner()).await;
		obs::record_op_outcome(KIND, OpOutcome::Success);
	}

	async fn logout_inner(&self) {
		let _serial = self.session_guard.lock().await;
		let request = RequestDescriptor::post(self.descriptor.auth_routes.logout.clone());
		let _ = self.request(request).await;

		self.clear_local_session();
		self.erase_snapshot_advisory().await;
	}

	/// Rehydrates the session from the store, refreshing it before first use.
	///
	/// Returns the signed-in identity when a stored session is still valid and
	/// `None` when there is nothing to restore or the backend definitively
	/// rejected the stored session. Transient failures surface as `Err` and
	/// leave the snapshot in the store for the next attempt. The client
	/// reports [`is_ready`](Self::is_ready) once this settles, whatever the
	/// outcome.
	pub async fn bootstrap(&self) -> Result<Option<User>> {
		const KIND: OpKind = OpKind::Bootstrap;

		let span = OpSpan::new(KIND, "bootstrap");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.bootstrap_inner()).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		self.state.ready.store(true, Ordering::Release);

		result
	}

	async fn bootstrap_inner(&self) -> Result<Option<User>> {
		let _serial = self.session_guard.lock().await;
		let snapshot = match self.store.load(self.store_key()).await {
			Ok(snapshot) => snapshot,
			Err(e) => {
				obs::record_store_degraded("load", &e);

				None
			},
		};
		let Some(snapshot) = snapshot else { return Ok(None) };

		self.install_token(Some(snapshot.access_token));

		// Validate the restored session before first use; a stale token would
		// only bounce off the first authenticated request anyway.
		match self.refresh_access_token().await {
			Ok(_) => (),
			Err(e) if e.is_definitive() => return Ok(None),
			Err(e) => return Err(e.into()),
		}

		let request = RequestDescriptor::get(self.descriptor.auth_routes.identity.clone());
		let response = match self.request(request).await {
			Ok(response) => response,
			Err(Error::Refresh(e)) if e.is_definitive() => return Ok(None),
			Err(e) => return Err(e),
		};

		if !response.is_success() {
			self.clear_local_session();
			self.erase_snapshot_advisory().await;

			return Ok(None);
		}

		let user = response.json::<User>("identity response")?;

		self.state.identity.write().replace(user.clone());

		Ok(Some(user))
	}
}
