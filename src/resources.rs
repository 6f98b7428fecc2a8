//! Typed resource surface mapped over the authenticated request path.
//!
//! Every call here rides [`ApiClient::request`](crate::client::ApiClient::request), so bearer
//! injection, refresh waves, and replay come for free; these modules only add routes, parameter
//! encoding, and response shapes.

pub mod analytics;
pub mod catalog;
pub mod orders;
pub mod users;

// self
use crate::_prelude::*;

/// One page of a listed collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
	/// Rows of the requested page.
	pub items: Vec<T>,
	/// Row count across all pages.
	pub total: u64,
	/// Page count at the requested page size.
	pub total_pages: u32,
	/// 1-based index of this page.
	pub page: u32,
	/// Requested page size.
	pub limit: u32,
}
impl<T> Paged<T> {
	/// Returns `true` when a page beyond this one exists.
	pub fn has_next(&self) -> bool {
		self.page < self.total_pages
	}
}

/// Sort direction for list calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	/// Oldest or smallest first.
	Asc,
	/// Newest or largest first.
	Desc,
}
impl SortOrder {
	/// Returns the lowercase wire label for the direction.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortOrder::Asc => "asc",
			SortOrder::Desc => "desc",
		}
	}
}
impl Display for SortOrder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
