//! Product catalog administration and the aggregate stock overview.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{HttpTransport, RequestDescriptor},
	resources::{Paged, SortOrder},
};

/// Product document in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	/// Backend identifier.
	#[serde(rename = "_id")]
	pub id: String,
	/// Display title.
	pub title: String,
	/// Stock-keeping unit, unique per catalog.
	pub sku: String,
	/// Free-form category label.
	#[serde(default)]
	pub category: Option<String>,
	/// Unit price in `currency`.
	pub price: f64,
	/// Currency label, e.g. `TRY`.
	pub currency: String,
	/// Units on hand.
	pub stock: i64,
	/// Lifecycle status.
	pub status: ProductStatus,
	/// Creation timestamp, when the backend includes one.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// Lifecycle status of a [`Product`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
	/// Listed and sellable.
	Active,
	/// Hidden from sale but kept in the catalog.
	Inactive,
	/// Retired for good.
	Archived,
}
impl ProductStatus {
	/// Returns the lowercase wire label for the status.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProductStatus::Active => "active",
			ProductStatus::Inactive => "inactive",
			ProductStatus::Archived => "archived",
		}
	}
}
impl Display for ProductStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Payload for creating or replacing a product.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
	/// Display title.
	pub title: String,
	/// Stock-keeping unit.
	pub sku: String,
	/// Free-form category label.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// Unit price in `currency`.
	pub price: f64,
	/// Currency label.
	pub currency: String,
	/// Units on hand.
	pub stock: i64,
	/// Lifecycle status.
	pub status: ProductStatus,
}
impl ProductDraft {
	/// Starts a draft with the backend's customary defaults.
	pub fn new(title: impl Into<String>, sku: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			sku: sku.into(),
			category: None,
			price: 0.,
			currency: "TRY".into(),
			stock: 0,
			status: ProductStatus::Active,
		}
	}
}

/// Filters for the catalog listing.
///
/// Unset fields are omitted from the query string, so the backend's defaults
/// apply.
#[derive(Clone, Debug, Default)]
pub struct ProductListQuery {
	/// 1-based page to fetch.
	pub page: Option<u32>,
	/// Page size.
	pub limit: Option<u32>,
	/// Free-text search over title and SKU, sent as `q`.
	pub search: Option<String>,
	/// Restrict to one lifecycle status.
	pub status: Option<ProductStatus>,
	/// Restrict to one category label.
	pub category: Option<String>,
	/// Field to sort by, e.g. `createdAt`.
	pub sort_by: Option<String>,
	/// Sort direction.
	pub sort_order: Option<SortOrder>,
}

/// Aggregate stock overview for a dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOverview {
	/// Catalog-wide counters.
	pub totals: CatalogTotals,
	/// Products at or below the requested stock threshold.
	#[serde(default)]
	pub low_stock: Vec<Product>,
}

/// Catalog-wide counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTotals {
	/// All products.
	pub total_products: u64,
	/// Products with `active` status.
	pub active_products: u64,
	/// Units on hand across the catalog.
	pub total_stock: i64,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists products matching `query`, one page at a time.
	pub async fn list_products(&self, query: &ProductListQuery) -> Result<Paged<Product>> {
		let mut request = RequestDescriptor::get("/products");

		if let Some(page) = query.page {
			request = request.query("page", page);
		}
		if let Some(limit) = query.limit {
			request = request.query("limit", limit);
		}
		if let Some(search) = &query.search {
			request = request.query("q", search);
		}
		if let Some(status) = query.status {
			request = request.query("status", status);
		}
		if let Some(category) = &query.category {
			request = request.query("category", category);
		}
		if let Some(sort_by) = &query.sort_by {
			request = request.query("sortBy", sort_by);
		}
		if let Some(sort_order) = query.sort_order {
			request = request.query("sortOrder", sort_order);
		}

		let response = self.request(request).await?.require_success()?;

		Ok(response.json("product list")?)
	}

	/// Creates a product from `draft`, returning the stored document.
	pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
		let request = RequestDescriptor::post("/products").json(draft)?;
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("product create")?)
	}

	/// Replaces the product identified by `id` with `draft`, returning the
	/// updated document.
	pub async fn update_product(&self, id: &str, draft: &ProductDraft) -> Result<Product> {
		let request = RequestDescriptor::patch(format!("/products/{id}")).json(draft)?;
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("product update")?)
	}

	/// Deletes the product identified by `id`.
	pub async fn delete_product(&self, id: &str) -> Result<()> {
		self.request(RequestDescriptor::delete(format!("/products/{id}")))
			.await?
			.require_success()?;

		Ok(())
	}

	/// Fetches catalog totals plus the products whose stock sits at or below
	/// `low_stock_threshold`.
	pub async fn catalog_overview(&self, low_stock_threshold: u32) -> Result<CatalogOverview> {
		let request = RequestDescriptor::get("/overview").query("lowStock", low_stock_threshold);
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("catalog overview")?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn product_decodes_backend_document() {
		let product = serde_json::from_str::<Product>(
			r#"{"_id":"p-1","title":"Mug","sku":"MUG-01","price":149.9,"currency":"TRY","stock":12,"status":"active"}"#,
		)
		.expect("Backend product document should decode.");

		assert_eq!(product.id, "p-1");
		assert_eq!(product.status, ProductStatus::Active);
		assert!(product.category.is_none());
		assert!(product.created_at.is_none());
	}

	#[test]
	fn draft_serializes_without_unset_category() {
		let body = serde_json::to_string(&ProductDraft::new("Mug", "MUG-01"))
			.expect("Draft should serialize.");

		assert!(body.contains("\"currency\":\"TRY\""));
		assert!(body.contains("\"status\":\"active\""));
		assert!(!body.contains("category"));
	}
}
