use crate::core::listing::listing_for;
use crate::core::render::{bundle_zip, render_product};
use crate::core::text::slugify;
use crate::domain::model::{Product, UploadReport, UploadStatus, UploadedProduct};
use crate::domain::ports::{Marketplace, Storage};
use crate::utils::error::{AutomationError, Result};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const MANIFEST_FILE: &str = ".uploaded.json";

/// 把 products 目錄中尚未上架的商品文件批次上架到 Whop
pub struct BatchUploader<M: Marketplace, S: Storage> {
    marketplace: M,
    storage: S,
    products_dir: String,
    output_dir: String,
    upload_delay: Duration,
}

impl<M: Marketplace, S: Storage> BatchUploader<M, S> {
    pub fn new(
        marketplace: M,
        storage: S,
        products_dir: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            marketplace,
            storage,
            products_dir: products_dir.into(),
            output_dir: output_dir.into(),
            upload_delay: Duration::from_secs(1),
        }
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn marketplace(&self) -> &M {
        &self.marketplace
    }

    fn manifest_path(&self) -> String {
        format!("{}/{}", self.products_dir.trim_end_matches('/'), MANIFEST_FILE)
    }

    /// 清單存在卻讀不了時回傳錯誤，避免重複上架
    async fn load_manifest(&self) -> Result<BTreeSet<String>> {
        let path = self.manifest_path();
        if !self.storage.exists(&path).await {
            return Ok(BTreeSet::new());
        }

        let data = self.storage.read_file(&path).await?;
        serde_json::from_slice(&data).map_err(|e| AutomationError::ProcessingError {
            message: format!(
                "upload manifest {} is unreadable ({}); fix or remove it before uploading again",
                path, e
            ),
        })
    }

    async fn save_manifest(&self, uploaded: &BTreeSet<String>) -> Result<()> {
        let data = serde_json::to_vec_pretty(uploaded)?;
        self.storage.write_file(&self.manifest_path(), &data).await
    }

    pub async fn upload_products_from_directory(&self) -> Result<UploadReport> {
        let files = self.storage.list_files(&self.products_dir, "json").await?;
        let mut report = UploadReport::default();

        if files.is_empty() {
            info!("📭 No product files found in {}", self.products_dir);
            return Ok(report);
        }

        let mut uploaded = self.load_manifest().await?;
        let mut attempted = 0usize;

        for path in &files {
            let file_name = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();

            if uploaded.contains(&file_name) {
                debug!("⏭️ Already uploaded: {}", file_name);
                report.skipped += 1;
                continue;
            }

            if attempted > 0 && !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }
            attempted += 1;

            let product = match self.read_product(path).await {
                Ok(product) => product,
                Err(e) => {
                    error!("❌ Unreadable product file {}: {}", path, e);
                    report.failed += 1;
                    report.products.push(UploadedProduct {
                        title: file_name,
                        whop_id: None,
                        status: UploadStatus::Failed,
                    });
                    continue;
                }
            };

            match self.marketplace.create_product(&listing_for(&product)).await {
                Ok(created) => {
                    info!("✅ Uploaded: {} ({})", product.title, created.id);
                    self.attach_files(&created.id, &product).await;

                    report.success += 1;
                    report.products.push(UploadedProduct {
                        title: product.title,
                        whop_id: Some(created.id),
                        status: UploadStatus::Success,
                    });

                    uploaded.insert(file_name);
                    if let Err(e) = self.save_manifest(&uploaded).await {
                        error!("❌ Failed to update upload manifest, stopping batch: {}", e);
                        return Err(e);
                    }
                }
                Err(e) => {
                    error!("❌ Failed to upload {}: {}", product.title, e);
                    report.failed += 1;
                    report.products.push(UploadedProduct {
                        title: product.title,
                        whop_id: None,
                        status: UploadStatus::Failed,
                    });
                }
            }
        }

        info!(
            "📦 Upload finished: {} success, {} failed, {} skipped",
            report.success, report.failed, report.skipped
        );
        Ok(report)
    }

    async fn read_product(&self, path: &str) -> Result<Product> {
        let data = self.storage.read_file(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 輸出可下載檔案並以 ZIP 附加到商品；失敗只記錄，不影響上架結果
    async fn attach_files(&self, whop_id: &str, product: &Product) {
        if !is_safe_segment(whop_id) {
            warn!("⚠️ Refusing to write files for unexpected listing id {:?}", whop_id);
            return;
        }

        let result: Result<String> = async {
            let files = render_product(product)?;
            let dir = format!("{}/{}", self.output_dir.trim_end_matches('/'), whop_id);
            for file in &files {
                self.storage
                    .write_file(&format!("{}/{}", dir, file.name), &file.contents)
                    .await?;
            }

            let bundle = bundle_zip(&files)?;
            let file_name = format!("{}.zip", slugify(&product.title));
            self.marketplace
                .upload_asset(whop_id, &file_name, bundle)
                .await
        }
        .await;

        match result {
            Ok(asset_id) => debug!("📎 Asset {} attached to {}", asset_id, whop_id),
            Err(e) => warn!("⚠️ Asset upload for {} failed: {}", whop_id, e),
        }
    }
}

/// 單一路徑片段：不可為空、不含分隔符號或 `..`
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains('/')
        && !segment.contains('\\')
        && !segment.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{FakeMarketplace, MockStorage};
    use crate::domain::model::{Chapter, ProductDetails};
    use chrono::Local;

    fn ebook(title: &str) -> Product {
        Product {
            title: title.to_string(),
            description: "desc".to_string(),
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: Some(true),
            suggested_price: 15,
            tags: vec![],
            word_count: 3,
            details: ProductDetails::Ebook {
                subtitle: String::new(),
                topic: "Finance".to_string(),
                target_audience: "everyone".to_string(),
                chapters: vec![Chapter {
                    title: "One".to_string(),
                    content: "Some chapter text".to_string(),
                }],
                bonus_sections: vec![],
            },
        }
    }

    async fn seed(storage: &MockStorage, name: &str, product: &Product) {
        storage
            .write_file(
                &format!("generated_products/{}", name),
                &serde_json::to_vec(product).unwrap(),
            )
            .await
            .unwrap();
    }

    fn uploader(marketplace: FakeMarketplace, storage: MockStorage) -> BatchUploader<FakeMarketplace, MockStorage> {
        BatchUploader::new(marketplace, storage, "generated_products", "output")
            .with_upload_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_missing_directory_gives_empty_report() {
        let uploader = uploader(FakeMarketplace::new(), MockStorage::new());
        let report = uploader.upload_products_from_directory().await.unwrap();
        assert_eq!(report, UploadReport::default());
    }

    #[tokio::test]
    async fn test_uploads_renders_and_records_manifest() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;
        seed(&storage, "ebook_b.json", &ebook("Book B")).await;

        let marketplace = FakeMarketplace::new();
        let created = marketplace.created.clone();
        let assets = marketplace.assets.clone();
        let uploader = uploader(marketplace, storage.clone());

        let report = uploader.upload_products_from_directory().await.unwrap();

        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.products[0].title, "Book A");
        assert_eq!(report.products[0].whop_id.as_deref(), Some("prod_1"));
        assert_eq!(created.lock().await[1].price, 1500);

        let assets = assets.lock().await;
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].0, "prod_1");
        assert_eq!(assets[0].1, "book_a.zip");

        assert_eq!(
            storage.paths_under("output/prod_2").await,
            vec!["output/prod_2/ebook.html", "output/prod_2/ebook.md", "output/prod_2/ebook.txt"]
        );

        let manifest = storage.get_text("generated_products/.uploaded.json").await.unwrap();
        let manifest: Vec<String> = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest, vec!["ebook_a.json", "ebook_b.json"]);
    }

    #[tokio::test]
    async fn test_second_run_skips_uploaded_files() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;

        let marketplace = FakeMarketplace::new();
        let created = marketplace.created.clone();
        let uploader = uploader(marketplace, storage.clone());

        uploader.upload_products_from_directory().await.unwrap();
        seed(&storage, "ebook_c.json", &ebook("Book C")).await;
        let report = uploader.upload_products_from_directory().await.unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(created.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Rejected Book")).await;
        storage
            .write_file("generated_products/broken.json", b"{not json")
            .await
            .unwrap();

        let mut marketplace = FakeMarketplace::new();
        marketplace.reject_titles.push("Rejected".to_string());
        let uploader = uploader(marketplace, storage.clone());

        let report = uploader.upload_products_from_directory().await.unwrap();

        assert_eq!(report.success, 0);
        assert_eq!(report.failed, 2);
        // broken.json sorts first
        assert_eq!(report.products[0].title, "broken.json");
        assert_eq!(report.products[1].title, "Rejected Book");
        assert_eq!(report.products[1].status, UploadStatus::Failed);
        assert!(!storage.exists("generated_products/.uploaded.json").await);
    }

    #[tokio::test]
    async fn test_asset_failure_still_counts_as_uploaded() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;

        let mut marketplace = FakeMarketplace::new();
        marketplace.reject_assets = true;
        let uploader = uploader(marketplace, storage.clone());

        let report = uploader.upload_products_from_directory().await.unwrap();
        assert_eq!(report.success, 1);
        assert!(storage.exists("generated_products/.uploaded.json").await);
    }

    #[tokio::test]
    async fn test_corrupt_manifest_stops_upload() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;

        let marketplace = FakeMarketplace::new();
        let created = marketplace.created.clone();
        let uploader = uploader(marketplace, storage.clone());
        uploader.upload_products_from_directory().await.unwrap();

        storage
            .write_file("generated_products/.uploaded.json", b"[\"ebook_a.json\"")
            .await
            .unwrap();

        let result = uploader.upload_products_from_directory().await;
        assert!(matches!(result, Err(AutomationError::ProcessingError { .. })));
        assert_eq!(created.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_manifest_write_failure_stops_batch() {
        let mut storage = MockStorage::new();
        storage.fail_writes_to = Some("generated_products/.uploaded.json".to_string());
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;
        seed(&storage, "ebook_b.json", &ebook("Book B")).await;

        let marketplace = FakeMarketplace::new();
        let created = marketplace.created.clone();
        let uploader = uploader(marketplace, storage);

        assert!(uploader.upload_products_from_directory().await.is_err());
        assert_eq!(created.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unsafe_listing_id_writes_nothing() {
        let storage = MockStorage::new();
        seed(&storage, "ebook_a.json", &ebook("Book A")).await;

        let mut marketplace = FakeMarketplace::new();
        marketplace.listing_id = Some("../../escape".to_string());
        let assets = marketplace.assets.clone();
        let uploader = uploader(marketplace, storage.clone());

        let report = uploader.upload_products_from_directory().await.unwrap();

        assert_eq!(report.success, 1);
        assert!(assets.lock().await.is_empty());
        let files = storage.files.lock().await;
        assert!(files.keys().all(|path| !path.contains("..")));
        assert!(files.keys().all(|path| !path.starts_with("output")));
    }

    #[test]
    fn test_safe_segment() {
        assert!(is_safe_segment("prod_123"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment("../x"));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment("a\\b"));
    }
}
