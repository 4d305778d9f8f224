use crate::adapters::action_log::ActionLog;
use crate::domain::model::{
    CreatedListing, Listing, ListingRequest, ProductAnalytics, WebhookRequest,
};
use crate::domain::ports::{Marketplace, Storage};
use crate::utils::error::{AutomationError, Result};
use crate::utils::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_WHOP_URL: &str = "https://api.whop.com/api/v5";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Listing>,
}

/// Whop v5 REST 用戶端；建立、上傳與調價都會寫入 action log
pub struct WhopClient<S: Storage> {
    client: Client,
    base_url: String,
    api_key: String,
    company_id: String,
    action_log: ActionLog<S>,
    retry: RetryPolicy,
}

impl<S: Storage> WhopClient<S> {
    pub fn new(
        base_url: &str,
        api_key: &str,
        company_id: &str,
        timeout: Duration,
        action_log: ActionLog<S>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            company_id: company_id.to_string(),
            action_log,
            retry: RetryPolicy::default(),
        })
    }

    /// 只套用在讀取請求；建立類請求重送可能造成重複商品
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn company_url(&self, suffix: &str) -> String {
        format!("{}/companies/{}/{}", self.base_url, self.company_id, suffix)
    }

    fn product_url(&self, product_id: &str, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/products/{}", self.base_url, product_id)
        } else {
            format!("{}/products/{}/{}", self.base_url, product_id, suffix)
        }
    }

    async fn check(action: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AutomationError::MarketplaceError {
            action: action.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn post_listing(&self, action: &str, listing: &ListingRequest) -> Result<CreatedListing> {
        let result: Result<CreatedListing> = async {
            let response = self
                .client
                .post(self.company_url("products"))
                .bearer_auth(&self.api_key)
                .json(listing)
                .send()
                .await?;
            let created: IdResponse = Self::check(action, response).await?.json().await?;
            Ok(CreatedListing { id: created.id })
        }
        .await;

        match &result {
            Ok(created) => {
                tracing::info!("✅ {} '{}' created! ID: {}", action, listing.title, created.id);
                self.action_log
                    .record(
                        action,
                        "success",
                        json!({"product_id": created.id, "title": listing.title, "price": listing.price}),
                    )
                    .await;
            }
            Err(e) => {
                tracing::error!("❌ {} '{}' failed: {}", action, listing.title, e);
                self.action_log
                    .record(action, "error", json!({"title": listing.title, "error": e.to_string()}))
                    .await;
            }
        }
        result
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, action: &str, url: String) -> Result<T> {
        let url = &url;
        with_retry(self.retry, action, move || async move {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let parsed = Self::check(action, response).await?.json::<T>().await?;
            Ok(parsed)
        })
        .await
    }
}

#[async_trait]
impl<S: Storage> Marketplace for WhopClient<S> {
    async fn create_product(&self, listing: &ListingRequest) -> Result<CreatedListing> {
        tracing::info!("📦 Creating product: {}", listing.title);
        self.post_listing("create_product", listing).await
    }

    async fn upload_asset(
        &self,
        product_id: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String> {
        tracing::info!("📤 Uploading digital asset for product {}", product_id);
        let size = data.len();

        let result: Result<String> = async {
            let part = multipart::Part::bytes(data).file_name(file_name.to_string());
            let form = multipart::Form::new().part("file", part);
            let response = self
                .client
                .post(self.product_url(product_id, "assets"))
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await?;
            let created: IdResponse = Self::check("upload_asset", response).await?.json().await?;
            Ok(created.id)
        }
        .await;

        match &result {
            Ok(asset_id) => {
                tracing::info!("✅ Asset uploaded successfully! ID: {}", asset_id);
                self.action_log
                    .record(
                        "upload_asset",
                        "success",
                        json!({"product_id": product_id, "asset_id": asset_id, "file_name": file_name, "bytes": size}),
                    )
                    .await;
            }
            Err(e) => {
                self.action_log
                    .record(
                        "upload_asset",
                        "error",
                        json!({"product_id": product_id, "file_name": file_name, "error": e.to_string()}),
                    )
                    .await;
            }
        }
        result
    }

    async fn create_membership(&self, listing: &ListingRequest) -> Result<CreatedListing> {
        tracing::info!("🎫 Creating membership: {}", listing.title);
        self.post_listing("create_membership", listing).await
    }

    async fn update_price(&self, product_id: &str, new_price: u64) -> Result<()> {
        tracing::info!(
            "💰 Updating price for product {} to ${:.2}",
            product_id,
            new_price as f64 / 100.0
        );

        let result: Result<()> = async {
            let response = self
                .client
                .patch(self.product_url(product_id, ""))
                .bearer_auth(&self.api_key)
                .json(&json!({ "price": new_price }))
                .send()
                .await?;
            Self::check("update_price", response).await?;
            Ok(())
        }
        .await;

        match &result {
            Ok(()) => {
                self.action_log
                    .record(
                        "update_price",
                        "success",
                        json!({"product_id": product_id, "new_price": new_price}),
                    )
                    .await
            }
            Err(e) => {
                self.action_log
                    .record(
                        "update_price",
                        "error",
                        json!({"product_id": product_id, "new_price": new_price, "error": e.to_string()}),
                    )
                    .await
            }
        }
        result
    }

    async fn product_analytics(&self, product_id: &str) -> Result<ProductAnalytics> {
        self.get_json("product_analytics", self.product_url(product_id, "analytics"))
            .await
    }

    async fn list_products(&self) -> Result<Vec<Listing>> {
        let listed: ListResponse = self
            .get_json("list_products", self.company_url("products"))
            .await?;
        Ok(listed.data)
    }

    async fn create_webhook(&self, webhook: &WebhookRequest) -> Result<String> {
        tracing::info!("🔗 Setting up webhook: {}", webhook.url);

        let result: Result<String> = async {
            let response = self
                .client
                .post(self.company_url("webhooks"))
                .bearer_auth(&self.api_key)
                .json(webhook)
                .send()
                .await?;
            let created: IdResponse = Self::check("create_webhook", response).await?.json().await?;
            Ok(created.id)
        }
        .await;

        match &result {
            Ok(webhook_id) => {
                tracing::info!("✅ Webhook created! ID: {}", webhook_id);
                self.action_log
                    .record(
                        "create_webhook",
                        "success",
                        json!({"webhook_id": webhook_id, "url": webhook.url, "events": webhook.events}),
                    )
                    .await;
            }
            Err(e) => {
                tracing::error!("❌ Webhook setup failed: {}", e);
                self.action_log
                    .record(
                        "create_webhook",
                        "error",
                        json!({"url": webhook.url, "error": e.to_string()}),
                    )
                    .await;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn client_for(server: &MockServer, temp_dir: &TempDir) -> WhopClient<LocalStorage> {
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        WhopClient::new(
            &server.url("/api/v5"),
            "whop-key",
            "biz_123",
            Duration::from_secs(5),
            ActionLog::new(storage, "logs"),
        )
        .unwrap()
        .with_retry(RetryPolicy::new(2, Duration::ZERO))
    }

    fn listing() -> ListingRequest {
        ListingRequest {
            title: "Money Basics".to_string(),
            description: "A guide".to_string(),
            price: 1500,
            listing_type: "one_time".to_string(),
            visibility: "public".to_string(),
            stock: -1,
            category: Some("education".to_string()),
            billing_period: None,
            tags: vec!["finance".to_string()],
            metadata: serde_json::Map::new(),
            apps: vec![],
            roles: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_product_posts_to_company() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v5/companies/biz_123/products")
                .header("authorization", "Bearer whop-key")
                .json_body_partial(r#"{"title": "Money Basics", "price": 1500, "type": "one_time", "stock": -1}"#);
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": "prod_42"}));
        });

        let client = client_for(&server, &temp_dir);
        let created = client.create_product(&listing()).await.unwrap();

        api_mock.assert();
        assert_eq!(created.id, "prod_42");

        let log = std::fs::read_to_string(temp_dir.path().join(client.action_log.file_for_today()))
            .unwrap();
        assert!(log.contains("\"action\":\"create_product\""));
        assert!(log.contains("\"status\":\"success\""));
    }

    #[tokio::test]
    async fn test_create_product_rejection_is_logged() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        server.mock(|when, then| {
            when.method(POST).path("/api/v5/companies/biz_123/products");
            then.status(422).body("price too low");
        });

        let client = client_for(&server, &temp_dir);
        let err = client.create_product(&listing()).await.unwrap_err();

        match err {
            AutomationError::MarketplaceError { status, ref body, .. } => {
                assert_eq!(status, 422);
                assert_eq!(body, "price too low");
            }
            ref other => panic!("unexpected error: {:?}", other),
        }
        let log = std::fs::read_to_string(temp_dir.path().join(client.action_log.file_for_today()))
            .unwrap();
        assert!(log.contains("\"status\":\"error\""));
    }

    #[tokio::test]
    async fn test_list_products_reads_data_array() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        server.mock(|when, then| {
            when.method(GET).path("/api/v5/companies/biz_123/products");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "data": [
                        {"id": "prod_1", "title": "A", "price": 1500, "metadata": {"auto_generated": true}},
                        {"id": "prod_2", "title": "B", "price": 900}
                    ]
                }));
        });

        let products = client_for(&server, &temp_dir).list_products().await.unwrap();

        assert_eq!(products.len(), 2);
        assert!(products[0].is_auto_generated());
        assert!(!products[1].is_auto_generated());
    }

    #[tokio::test]
    async fn test_analytics_missing_fields_default_to_zero() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        server.mock(|when, then| {
            when.method(GET).path("/api/v5/products/prod_1/analytics");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"views": 150}));
        });

        let analytics = client_for(&server, &temp_dir)
            .product_analytics("prod_1")
            .await
            .unwrap();

        assert_eq!(analytics.views, 150);
        assert_eq!(analytics.purchases, 0);
        assert_eq!(analytics.revenue, 0);
    }

    #[tokio::test]
    async fn test_update_price_patches_product() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        let api_mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/v5/products/prod_1")
                .json_body(serde_json::json!({"price": 1200}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": "prod_1", "price": 1200}));
        });

        client_for(&server, &temp_dir)
            .update_price("prod_1", 1200)
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_upload_asset_sends_multipart() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v5/products/prod_1/assets")
                .body_contains("filename=\"bundle.zip\"");
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": "asset_9"}));
        });

        let asset_id = client_for(&server, &temp_dir)
            .upload_asset("prod_1", "bundle.zip", b"PK".to_vec())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(asset_id, "asset_9");
    }

    #[tokio::test]
    async fn test_create_webhook_returns_id() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v5/companies/biz_123/webhooks")
                .json_body(serde_json::json!({
                    "url": "https://example.com/hook",
                    "events": ["purchase.created"],
                    "active": true
                }));
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"id": "hook_1"}));
        });

        let client = client_for(&server, &temp_dir);
        let id = client
            .create_webhook(&WebhookRequest {
                url: "https://example.com/hook".to_string(),
                events: vec!["purchase.created".to_string()],
                active: true,
            })
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(id, "hook_1");

        let log = std::fs::read_to_string(temp_dir.path().join(client.action_log.file_for_today()))
            .unwrap();
        assert!(log.contains("\"create_webhook\""));
        assert!(log.contains("hook_1"));
    }

    #[tokio::test]
    async fn test_create_webhook_rejection_is_logged() {
        let server = MockServer::start();
        let temp_dir = TempDir::new().unwrap();
        server.mock(|when, then| {
            when.method(POST).path("/api/v5/companies/biz_123/webhooks");
            then.status(403).body("forbidden");
        });

        let client = client_for(&server, &temp_dir);
        let result = client
            .create_webhook(&WebhookRequest {
                url: "https://example.com/hook".to_string(),
                events: vec![],
                active: true,
            })
            .await;

        assert!(matches!(
            result,
            Err(AutomationError::MarketplaceError { status: 403, .. })
        ));
        let log = std::fs::read_to_string(temp_dir.path().join(client.action_log.file_for_today()))
            .unwrap();
        assert!(log.contains("\"error\""));
    }
}
