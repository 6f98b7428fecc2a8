//! Revenue and sales analytics over a trailing window.

// self
use crate::{
	_prelude::*,
	client::ApiClient,
	http::{HttpTransport, RequestDescriptor},
};

/// Trailing window selector for analytics calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
	/// Trailing 7 days.
	#[default]
	#[serde(rename = "7d")]
	Last7Days,
	/// Trailing 30 days.
	#[serde(rename = "30d")]
	Last30Days,
	/// Trailing 90 days.
	#[serde(rename = "90d")]
	Last90Days,
	/// Trailing year.
	#[serde(rename = "1y")]
	LastYear,
}
impl TimeRange {
	/// Returns the wire label for the window.
	pub const fn as_str(self) -> &'static str {
		match self {
			TimeRange::Last7Days => "7d",
			TimeRange::Last30Days => "30d",
			TimeRange::Last90Days => "90d",
			TimeRange::LastYear => "1y",
		}
	}
}
impl Display for TimeRange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Headline figures for a trailing window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeKpis {
	/// Revenue summed over the window.
	#[serde(default)]
	pub revenue: f64,
	/// Orders counted over the window.
	#[serde(default)]
	pub orders: u64,
	/// Mean order value over the window.
	#[serde(default)]
	pub avg_order: f64,
}

/// One day of the overview series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
	/// Day label, as the backend formats it.
	pub date: String,
	/// Revenue for the day.
	#[serde(default)]
	pub revenue: f64,
	/// Orders placed that day.
	#[serde(default)]
	pub orders: u64,
	/// Distinct customers that day.
	#[serde(default)]
	pub customers: u64,
}

/// Daily series plus headline figures for the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
	/// Headline figures over the window.
	#[serde(default)]
	pub kpis: RangeKpis,
	/// Per-day revenue, order, and customer counts.
	#[serde(default)]
	pub series: Vec<SeriesPoint>,
}

/// Revenue recorded on one day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayRevenue {
	/// Day label, as the backend formats it.
	pub day: String,
	/// Revenue for the day.
	#[serde(default)]
	pub revenue: f64,
}

/// Sales rollup for one product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
	/// Backend identifier of the product.
	pub product_id: String,
	/// Product title, when still resolvable.
	#[serde(default)]
	pub title: Option<String>,
	/// Revenue attributed to the product.
	#[serde(default)]
	pub revenue: f64,
}

/// Spending rollup for one customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSales {
	/// Backend identifier of the customer.
	pub customer_id: String,
	/// Display name, when known.
	#[serde(default)]
	pub name: Option<String>,
	/// Contact email, when known.
	#[serde(default)]
	pub email: Option<String>,
	/// Orders placed over the window.
	#[serde(default)]
	pub orders: u64,
	/// Amount spent over the window.
	#[serde(default)]
	pub spent: f64,
}

/// Deep-dive rollups for the analytics page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedAnalytics {
	/// Headline figures over the window.
	#[serde(default)]
	pub kpi: RangeKpis,
	/// Revenue per day over the window.
	#[serde(default)]
	pub revenue_by_day: Vec<DayRevenue>,
	/// Best-selling products over the window.
	#[serde(default)]
	pub top_products: Vec<ProductSales>,
	/// Highest-spending customers over the window.
	#[serde(default)]
	pub top_customers: Vec<CustomerSales>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fetches the daily series and headline figures for `range`.
	pub async fn analytics_overview(&self, range: TimeRange) -> Result<AnalyticsOverview> {
		let request = RequestDescriptor::get("/analytics/overview").query("range", range);
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("analytics overview")?)
	}

	/// Fetches the deep-dive rollups for `range`.
	pub async fn advanced_analytics(&self, range: TimeRange) -> Result<AdvancedAnalytics> {
		let request = RequestDescriptor::get("/analytics/advanced").query("range", range);
		let response = self.request(request).await?.require_success()?;

		Ok(response.json("advanced analytics")?)
	}

	/// Fetches the all-time per-product sales rollup.
	pub async fn product_analytics(&self) -> Result<Vec<ProductSales>> {
		let response =
			self.request(RequestDescriptor::get("/analytics/products")).await?.require_success()?;

		Ok(response.json("product analytics")?)
	}
}
