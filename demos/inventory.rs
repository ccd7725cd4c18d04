//! Inventory service client built on `HttpClient`.
//!
//! ```text
//! INVENTORY_URL=https://inventory.example.com RUST_LOG=info cargo run --example inventory
//! ```

use std::time::Duration;

use resilient_http::{CallContext, ClientOptions, HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Inventory {
    id: u64,
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct CreateInventory<'a> {
    name: &'a str,
    description: &'a str,
}

struct InventoryClient {
    base_url: String,
    http: HttpClient,
}

impl InventoryClient {
    fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http,
        }
    }

    async fn items(&self, ctx: &CallContext) -> resilient_http::Result<Vec<Inventory>> {
        self.http
            .get(ctx, &format!("{}/inventory", self.base_url))
            .await
    }

    /// Returns `None` when the item does not exist.
    async fn item(&self, ctx: &CallContext, id: u64) -> resilient_http::Result<Option<Inventory>> {
        let url = format!("{}/inventory/{id}", self.base_url);
        match self.http.get(ctx, &url).await {
            Ok(item) => Ok(Some(item)),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create(
        &self,
        ctx: &CallContext,
        item: &CreateInventory<'_>,
    ) -> resilient_http::Result<Inventory> {
        self.http
            .post(ctx, &format!("{}/inventory", self.base_url), item)
            .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let base_url =
        std::env::var("INVENTORY_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
    let http = HttpClient::new(ClientOptions {
        timeout: Duration::from_secs(1),
        max_attempts: 3,
        base_delay: Duration::from_secs(1),
        factor: 1.3,
        logging: true,
        ..ClientOptions::default()
    })?;
    let inventory = InventoryClient::new(base_url, http);
    let ctx = CallContext::with_timeout(Duration::from_secs(30));

    let items = inventory.items(&ctx).await?;
    tracing::info!(count = items.len(), "fetched inventory");

    if let Some(first) = items.first() {
        match inventory.item(&ctx, first.id).await? {
            Some(item) => tracing::info!(id = item.id, name = %item.name, "fetched item"),
            None => tracing::warn!(id = first.id, "item disappeared"),
        }
    }

    let created = inventory
        .create(
            &ctx,
            &CreateInventory {
                name: "aa",
                description: "cc",
            },
        )
        .await?;
    tracing::info!(
        id = created.id,
        name = %created.name,
        description = %created.description,
        "created item"
    );

    Ok(())
}
