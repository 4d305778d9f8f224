//! core 模組單元測試共用的假實作

use crate::domain::model::{
    CreatedListing, Listing, ListingMetadata, ListingRequest, ProductAnalytics, WebhookRequest,
};
use crate::domain::ports::{CompletionRequest, LanguageModel, Marketplace, Storage};
use crate::utils::error::{AutomationError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MockStorage {
    pub files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// 寫入此路徑時回傳錯誤
    pub fail_writes_to: Option<String>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned()
    }

    pub async fn get_text(&self, path: &str) -> Option<String> {
        self.get_file(path)
            .await
            .map(|data| String::from_utf8_lossy(&data).to_string())
    }

    pub async fn paths_under(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir);
        let files = self.files.lock().await;
        let mut paths: Vec<String> = files
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            AutomationError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        if self.fail_writes_to.as_deref() == Some(path) {
            return Err(AutomationError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("read-only: {}", path),
            )));
        }
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().await;
        files
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    async fn list_files(&self, dir: &str, extension: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let suffix = format!(".{}", extension);
        let files = self.files.lock().await;

        let mut paths: Vec<String> = files
            .keys()
            .filter(|path| {
                path.strip_prefix(&prefix)
                    .map(|name| !name.contains('/') && !name.starts_with('.') && name.ends_with(&suffix))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.lock().await.contains_key(path)
    }
}

pub const OUTLINE_RESPONSE: &str = r#"```json
{
  "title": "Money Basics",
  "subtitle": "Start here",
  "chapters": [
    {"title": "Budgeting", "description": "Track spending"},
    {"title": "Saving", "description": "Pay yourself first"}
  ],
  "target_words": 3000,
  "bonus_sections": ["Checklist"],
  "cta_ideas": ["Join the newsletter"]
}
```"#;

pub const NOTION_RESPONSE: &str = r#"{"name": "Freelance CRM", "description": "Track clients", "instructions": ["Duplicate", "Customize"], "databases": ["Clients"]}"#;

pub const PLANNER_RESPONSE: &str = r#"{"description": "Plan every week", "pages": ["cover", "weekly"]}"#;

pub const EMAIL_RESPONSE: &str = "Subject Line: Welcome, [FIRST_NAME]!\n\nThanks for joining.\nClick here to get your bonus.";

/// 依提示詞內容回傳固定答案；`failing_on` 的字串命中時回傳錯誤
#[derive(Clone, Default)]
pub struct ScriptedModel {
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    failing: Vec<String>,
    overrides: Vec<(String, String)>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn answering(mut self, needle: &str, answer: &str) -> Self {
        self.overrides.push((needle.to_string(), answer.to_string()));
        self
    }

    fn respond(prompt: &str) -> String {
        if prompt.contains("outline") {
            OUTLINE_RESPONSE.to_string()
        } else if prompt.contains("Write a comprehensive chapter") {
            "Chapter body with five words".to_string()
        } else if prompt.contains("product description") {
            "A great product.".to_string()
        } else if prompt.contains("Notion template") {
            NOTION_RESPONSE.to_string()
        } else if prompt.contains("planner template") {
            PLANNER_RESPONSE.to_string()
        } else if prompt.contains("email template") {
            EMAIL_RESPONSE.to_string()
        } else {
            String::new()
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().await.push(request.clone());

        if self.failing.iter().any(|needle| request.prompt.contains(needle.as_str())) {
            return Err(AutomationError::ModelError {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }

        if let Some((_, answer)) = self
            .overrides
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
        {
            return Ok(answer.clone());
        }

        Ok(Self::respond(&request.prompt))
    }
}

/// 記錄所有呼叫的假 Whop
#[derive(Clone, Default)]
pub struct FakeMarketplace {
    pub created: Arc<Mutex<Vec<ListingRequest>>>,
    pub assets: Arc<Mutex<Vec<(String, String, usize)>>>,
    pub price_updates: Arc<Mutex<Vec<(String, u64)>>>,
    pub webhooks: Arc<Mutex<Vec<WebhookRequest>>>,
    pub listings: Vec<Listing>,
    pub analytics: HashMap<String, ProductAnalytics>,
    pub reject_titles: Vec<String>,
    pub reject_assets: bool,
    pub reject_listing: bool,
    /// 取代自動產生的 `prod_N` 商品 id
    pub listing_id: Option<String>,
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, id: &str, price: u64, auto_generated: bool, analytics: ProductAnalytics) -> Self {
        self.listings.push(Listing {
            id: id.to_string(),
            title: format!("Listing {}", id),
            price,
            metadata: ListingMetadata {
                auto_generated,
                product_type: None,
            },
        });
        self.analytics.insert(id.to_string(), analytics);
        self
    }

    fn rejection(action: &str) -> AutomationError {
        AutomationError::MarketplaceError {
            action: action.to_string(),
            status: 422,
            body: "rejected".to_string(),
        }
    }
}

#[async_trait]
impl Marketplace for FakeMarketplace {
    async fn create_product(&self, listing: &ListingRequest) -> Result<CreatedListing> {
        if self.reject_titles.iter().any(|title| listing.title.contains(title.as_str())) {
            return Err(Self::rejection("create_product"));
        }

        let mut created = self.created.lock().await;
        created.push(listing.clone());
        Ok(CreatedListing {
            id: self
                .listing_id
                .clone()
                .unwrap_or_else(|| format!("prod_{}", created.len())),
        })
    }

    async fn upload_asset(&self, product_id: &str, file_name: &str, data: Vec<u8>) -> Result<String> {
        if self.reject_assets {
            return Err(Self::rejection("upload_asset"));
        }

        let mut assets = self.assets.lock().await;
        assets.push((product_id.to_string(), file_name.to_string(), data.len()));
        Ok(format!("asset_{}", assets.len()))
    }

    async fn create_membership(&self, listing: &ListingRequest) -> Result<CreatedListing> {
        self.create_product(listing).await
    }

    async fn update_price(&self, product_id: &str, new_price: u64) -> Result<()> {
        self.price_updates
            .lock()
            .await
            .push((product_id.to_string(), new_price));
        Ok(())
    }

    async fn product_analytics(&self, product_id: &str) -> Result<ProductAnalytics> {
        Ok(self.analytics.get(product_id).cloned().unwrap_or_default())
    }

    async fn list_products(&self) -> Result<Vec<Listing>> {
        if self.reject_listing {
            return Err(Self::rejection("list_products"));
        }
        Ok(self.listings.clone())
    }

    async fn create_webhook(&self, webhook: &WebhookRequest) -> Result<String> {
        let mut webhooks = self.webhooks.lock().await;
        webhooks.push(webhook.clone());
        Ok(format!("hook_{}", webhooks.len()))
    }
}
