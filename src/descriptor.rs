//! Backend descriptor: validated base URL, auth route set, and refresh policy.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default refresh-call deadline applied when the builder does not override it.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(10);

const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";
const DEFAULT_REFRESH_ROUTE: &str = "/auth/refresh";
const DEFAULT_LOGOUT_ROUTE: &str = "/auth/logout";
const DEFAULT_IDENTITY_ROUTE: &str = "/users/me";

/// Auth route set declared by a backend descriptor.
///
/// Routes are relative to the base URL and must be absolute paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRoutes {
	/// Credential exchange endpoint.
	pub login: String,
	/// Session refresh endpoint driven by the ambient cookie credential.
	pub refresh: String,
	/// Server-side session teardown endpoint.
	pub logout: String,
	/// Identity endpoint returning the signed-in profile.
	pub identity: String,
}
impl Default for AuthRoutes {
	fn default() -> Self {
		Self {
			login: DEFAULT_LOGIN_ROUTE.into(),
			refresh: DEFAULT_REFRESH_ROUTE.into(),
			logout: DEFAULT_LOGOUT_ROUTE.into(),
			identity: DEFAULT_IDENTITY_ROUTE.into(),
		}
	}
}

/// Immutable backend descriptor consumed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescriptor {
	/// Validated base URL every request path is appended to.
	pub base_url: Url,
	/// Auth route set used by the session operations and the 401 protocol.
	pub auth_routes: AuthRoutes,
	/// Deadline for a single refresh call.
	pub refresh_timeout: Duration,
}
impl ApiDescriptor {
	/// Creates a new builder seeded with the provided base URL string.
	pub fn builder(base_url: impl Into<String>) -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::new(base_url)
	}

	/// Resolves a request path against the base URL.
	///
	/// The base path prefixes the request path (`/api` + `/users` =
	/// `/api/users`); queries embedded in `path` survive the join.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let joined = format!(
			"{}/{}",
			self.base_url.as_str().trim_end_matches('/'),
			path.trim_start_matches('/'),
		);

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidRequestPath { path: path.into(), source })
	}

	/// Returns `true` when a 401 from `path` must pass through instead of
	/// triggering a refresh.
	///
	/// Login and refresh are exempt: a 401 there means the credentials or the
	/// session itself were rejected, and refreshing would loop.
	pub fn is_refresh_exempt(&self, path: &str) -> bool {
		// Both sides normalize, so a configured route with a trailing slash or
		// query still matches.
		let normalized = normalize_path(path);

		normalized == normalize_path(&self.auth_routes.login)
			|| normalized == normalize_path(&self.auth_routes.refresh)
	}
}

/// Builder for [`ApiDescriptor`] values.
#[derive(Clone, Debug)]
pub struct ApiDescriptorBuilder {
	base_url: String,
	auth_routes: AuthRoutes,
	refresh_timeout: Duration,
}
impl ApiDescriptorBuilder {
	fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			auth_routes: AuthRoutes::default(),
			refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
		}
	}

	/// Overrides the login route.
	pub fn login_route(mut self, path: impl Into<String>) -> Self {
		self.auth_routes.login = path.into();

		self
	}

	/// Overrides the refresh route.
	pub fn refresh_route(mut self, path: impl Into<String>) -> Self {
		self.auth_routes.refresh = path.into();

		self
	}

	/// Overrides the logout route.
	pub fn logout_route(mut self, path: impl Into<String>) -> Self {
		self.auth_routes.logout = path.into();

		self
	}

	/// Overrides the identity route.
	pub fn identity_route(mut self, path: impl Into<String>) -> Self {
		self.auth_routes.identity = path.into();

		self
	}

	/// Overrides the refresh-call deadline.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, ConfigError> {
		let base_url = Url::parse(&self.base_url)
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		if base_url.cannot_be_a_base() {
			return Err(ConfigError::BaseUrlNotABase);
		}
		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: base_url.scheme().into() });
		}
		if base_url.query().is_some() || base_url.fragment().is_some() {
			return Err(ConfigError::BaseUrlHasQueryOrFragment);
		}
		if self.refresh_timeout <= Duration::ZERO {
			return Err(ConfigError::NonPositiveRefreshTimeout);
		}

		for route in [
			&self.auth_routes.login,
			&self.auth_routes.refresh,
			&self.auth_routes.logout,
			&self.auth_routes.identity,
		] {
			if !route.starts_with('/') {
				return Err(ConfigError::RelativeAuthRoute { path: route.clone() });
			}
		}

		Ok(ApiDescriptor {
			base_url,
			auth_routes: self.auth_routes,
			refresh_timeout: self.refresh_timeout,
		})
	}
}

fn normalize_path(path: &str) -> &str {
	let without_query = path.split(['?', '#']).next().unwrap_or(path);

	without_query.trim_end_matches('/')
}
