//! User directory administration.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{HttpTransport, RequestDescriptor},
	resources::{Paged, SortOrder},
	session::{User, UserRole},
};

/// Filters for the user directory listing.
///
/// Unset fields are omitted from the query string, so the backend's defaults
/// apply.
#[derive(Clone, Debug, Default)]
pub struct UserListQuery {
	/// 1-based page to fetch.
	pub page: Option<u32>,
	/// Page size.
	pub limit: Option<u32>,
	/// Free-text search over name and email, sent as `q`.
	pub search: Option<String>,
	/// Restrict to one role.
	pub role: Option<UserRole>,
	/// Field to sort by, e.g. `createdAt`.
	pub sort_by: Option<String>,
	/// Sort direction.
	pub sort_order: Option<SortOrder>,
}

/// Partial update for a user document.
///
/// Absent fields are left untouched by the backend.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserUpdate {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New authorization role.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub role: Option<UserRole>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists users matching `query`, one page at a time.
	pub async fn list_users(&self, query: &UserListQuery) -> Result<Paged<User>> {
		let mut request = RequestDescriptor::get("/users");

		if let Some(page) = query.page {
			request = request.query("page", page);
		}
		if let Some(limit) = query.limit {
			request = request.query("limit", limit);
		}
		if let Some(search) = &query.search {
			request = request.query("q", search);
		}
		if let Some(role) = query.role {
			request = request.query("role", role);
		}
		if let Some(sort_by) = &query.sort_by {
			request = request.query("sortBy", sort_by);
		}
		if let Some(sort_order) = query.sort_order {
			request = request.query("sortOrder", sort_order);
		}

		let response = self.request(request).await?.require_success()?;

		Ok(response.json("user list")?)
	}

	/// Applies `update` to the user identified by `id`, returning the updated
	/// document.
	pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
		let request = RequestDescriptor::patch(format!("/users/{id}")).json(update)?;
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("user update")?)
	}

	/// Deletes the user identified by `id`.
	pub async fn delete_user(&self, id: &str) -> Result<()> {
		self.request(RequestDescriptor::delete(format!("/users/{id}"))).await?.require_success()?;

		Ok(())
	}
}
