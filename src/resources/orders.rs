//! Order workflow: listing, inspection, and status transitions.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{HttpTransport, RequestDescriptor},
	resources::Paged,
};

/// Order document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Backend identifier.
	#[serde(rename = "_id")]
	pub id: String,
	/// Purchasing customer, when the backend expands the reference.
	#[serde(default)]
	pub customer: Option<OrderCustomer>,
	/// Grand total in `currency`.
	pub total: f64,
	/// Currency label.
	pub currency: String,
	/// Workflow status.
	pub status: OrderStatus,
	/// Creation timestamp, when the backend includes one.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Purchased lines; list views may omit them.
	#[serde(default)]
	pub items: Vec<OrderLine>,
}

/// Customer block expanded onto an [`Order`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Contact email.
	#[serde(default)]
	pub email: Option<String>,
}

/// One purchased line on an [`Order`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
	/// Product title captured at purchase time.
	#[serde(default)]
	pub title_snapshot: Option<String>,
	/// Product reference, expanded or bare depending on the route.
	#[serde(default)]
	pub product: Option<LineProduct>,
	/// Quantity purchased.
	pub qty: u32,
	/// Unit price at purchase time.
	pub price: f64,
}
impl OrderLine {
	/// Returns the display title, preferring the at-purchase snapshot over the
	/// live product document.
	pub fn title(&self) -> Option<&str> {
		self.title_snapshot.as_deref().or(match &self.product {
			Some(LineProduct::Expanded { title }) => title.as_deref(),
			_ => None,
		})
	}
}

/// Product reference carried by an [`OrderLine`].
///
/// The backend sends a bare identifier on most routes and an expanded document
/// on the order detail route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineProduct {
	/// Expanded product document.
	Expanded {
		/// Live product title.
		#[serde(default)]
		title: Option<String>,
	},
	/// Bare product identifier.
	Id(String),
}

/// Workflow status of an [`Order`].
///
/// Completion and reversal carry stock side effects on the backend, so status
/// changes go through [`update_order_status`](ApiClient::update_order_status)
/// rather than a general patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Received, not yet picked up.
	Pending,
	/// Being prepared.
	Processing,
	/// Fulfilled; stock has been decremented.
	Completed,
	/// Abandoned before fulfillment.
	Cancelled,
	/// Reversed after completion.
	Refunded,
}
impl OrderStatus {
	/// Returns the lowercase wire label for the status.
	pub const fn as_str(self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Processing => "processing",
			OrderStatus::Completed => "completed",
			OrderStatus::Cancelled => "cancelled",
			OrderStatus::Refunded => "refunded",
		}
	}
}
impl Display for OrderStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Filters for the order listing.
///
/// Unset fields are omitted from the query string, so the backend's defaults
/// apply.
#[derive(Clone, Debug, Default)]
pub struct OrderListQuery {
	/// 1-based page to fetch.
	pub page: Option<u32>,
	/// Page size.
	pub limit: Option<u32>,
	/// Restrict to one workflow status.
	pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize)]
struct StatusChange {
	status: OrderStatus,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Lists orders matching `query`, one page at a time.
	pub async fn list_orders(&self, query: &OrderListQuery) -> Result<Paged<Order>> {
		let mut request = RequestDescriptor::get("/orders");

		if let Some(page) = query.page {
			request = request.query("page", page);
		}
		if let Some(limit) = query.limit {
			request = request.query("limit", limit);
		}
		if let Some(status) = query.status {
			request = request.query("status", status);
		}

		let response = self.request(request).await?.require_success()?;

		Ok(response.json("order list")?)
	}

	/// Fetches one order with its lines expanded.
	pub async fn order_by_id(&self, id: &str) -> Result<Order> {
		let response =
			self.request(RequestDescriptor::get(format!("/orders/{id}"))).await?.require_success()?;

		Ok(response.json("order detail")?)
	}

	/// Moves the order identified by `id` to `status`, returning the updated
	/// document.
	pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
		let request = RequestDescriptor::patch(format!("/orders/{id}/status"))
			.json(&StatusChange { status })?;
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("order status update")?)
	}

	/// Fetches the `limit` most recent orders, newest first.
	pub async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>> {
		let request = RequestDescriptor::get("/orders/recent").query("limit", limit);
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("recent orders")?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn line_title_prefers_the_snapshot() {
		let line = serde_json::from_str::<OrderLine>(
			r#"{"titleSnapshot":"Mug (2023)","product":{"title":"Mug"},"qty":2,"price":149.9}"#,
		)
		.expect("Expanded order line should decode.");

		assert_eq!(line.title(), Some("Mug (2023)"));
	}

	#[test]
	fn line_falls_back_to_the_expanded_product() {
		let line = serde_json::from_str::<OrderLine>(
			r#"{"product":{"title":"Mug"},"qty":1,"price":149.9}"#,
		)
		.expect("Order line without a snapshot should decode.");

		assert_eq!(line.title(), Some("Mug"));
	}

	#[test]
	fn line_accepts_a_bare_product_id() {
		let line = serde_json::from_str::<OrderLine>(
			r#"{"product":"p-1","qty":1,"price":10.0}"#,
		)
		.expect("Order line with a bare reference should decode.");

		assert_eq!(line.product, Some(LineProduct::Id("p-1".into())));
		assert_eq!(line.title(), None);
	}

	#[test]
	fn order_decodes_without_optional_blocks() {
		let order = serde_json::from_str::<Order>(
			r#"{"_id":"o-1","total":299.8,"currency":"TRY","status":"pending"}"#,
		)
		.expect("Minimal order document should decode.");

		assert_eq!(order.status, OrderStatus::Pending);
		assert!(order.customer.is_none());
		assert!(order.items.is_empty());
	}
}
