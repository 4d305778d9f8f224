use crate::domain::model::{
    CreatedListing, Listing, ListingRequest, ProductAnalytics, WebhookRequest,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 列出目錄下指定副檔名的檔案（回傳相對路徑，已排序）；目錄不存在時回傳空陣列
    fn list_files(
        &self,
        dir: &str,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn products_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn reports_dir(&self) -> &str;
    fn logs_dir(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn create_product(&self, listing: &ListingRequest) -> Result<CreatedListing>;
    async fn upload_asset(&self, product_id: &str, file_name: &str, data: Vec<u8>)
        -> Result<String>;
    async fn create_membership(&self, listing: &ListingRequest) -> Result<CreatedListing>;
    async fn update_price(&self, product_id: &str, new_price: u64) -> Result<()>;
    async fn product_analytics(&self, product_id: &str) -> Result<ProductAnalytics>;
    async fn list_products(&self) -> Result<Vec<Listing>>;
    async fn create_webhook(&self, webhook: &WebhookRequest) -> Result<String>;
}
