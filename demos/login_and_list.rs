//! Demonstrates signing in against a mock backend, listing the catalog through the authenticated
//! client, and riding out an access-token expiry without the caller ever seeing the 401.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use bearer_broker::{
	client::ApiClient,
	descriptor::ApiDescriptor,
	resources::catalog::ProductListQuery,
	store::{MemoryTokenStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "rt=demo-refresh; Path=/; HttpOnly")
				.body(
					"{\"accessToken\":\"demo-access\",\"user\":{\"_id\":\"u-1\",\"name\":\"Demo Admin\",\"email\":\"admin@example.com\",\"role\":\"admin\"}}",
				);
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/products").header("authorization", "Bearer demo-access");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh").header("cookie", "rt=demo-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"demo-access-2\"}");
		})
		.await;
	let products_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/products").header("authorization", "Bearer demo-access-2");
			then.status(200).header("content-type", "application/json").body(
				"{\"items\":[{\"_id\":\"p-1\",\"title\":\"Standing Desk\",\"sku\":\"DESK-1\",\"price\":4999.0,\"currency\":\"TRY\",\"stock\":12,\"status\":\"active\"}],\"total\":1,\"totalPages\":1,\"page\":1,\"limit\":20}",
			);
		})
		.await;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
	let descriptor = ApiDescriptor::builder(server.url("/api")).build()?;
	let client = ApiClient::new(store, descriptor)?;
	let user = client.login("admin@example.com", "hunter2").await?;

	println!("Signed in as {} ({}).", user.name, user.role);

	let page =
		client.list_products(&ProductListQuery { limit: Some(20), ..Default::default() }).await?;

	println!("Catalog page holds {} of {} products.", page.items.len(), page.total);
	println!(
		"The expired token was swapped mid-call: {} refresh wave, {} coalesced waiters.",
		client.refresh_metrics().attempts(),
		client.refresh_metrics().coalesced_waiters(),
	);

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	products_mock.assert_async().await;

	Ok(())
}
