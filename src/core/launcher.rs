use crate::core::generator::ProductGenerator;
use crate::core::listing::membership_listing;
use crate::core::pricing::optimize_price;
use crate::core::scheduler::{run_loop, JobKind, LoopTiming, Schedule};
use crate::core::uploader::BatchUploader;
use crate::domain::model::{
    default_niches, CreatedListing, CycleSummary, DailyReport, DailyTargets, Listing,
    MembershipRequest, Niche, PerformanceSummary, Product, UploadReport, WebhookRequest,
};
use crate::domain::ports::{LanguageModel, Marketplace, Storage};
use crate::utils::error::{AutomationError, Result};
use crate::utils::monitor::CycleMonitor;
use chrono::{Local, NaiveDate, Timelike};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

pub const NOTION_TEMPLATE_TYPES: [&str; 4] = [
    "productivity dashboard",
    "project tracker",
    "content calendar",
    "business planner",
];
pub const PLANNER_PERIODS: [&str; 3] = ["daily", "weekly", "monthly"];
pub const DEFAULT_WEBHOOK_EVENTS: [&str; 4] = [
    "purchase.created",
    "membership.created",
    "subscription.created",
    "payment.succeeded",
];

const SUMMARY_SAMPLE_SIZE: usize = 10;
const DAILY_CSV: &str = "daily_reports.csv";

#[derive(Debug, Clone)]
pub struct LauncherSettings {
    pub auto_generate: bool,
    pub auto_upload: bool,
    pub price_optimization: bool,
    pub max_daily_products: usize,
    pub targets: DailyTargets,
    pub niches: Vec<Niche>,
    pub generation_delay: Duration,
    pub request_delay: Duration,
    pub products_dir: String,
    pub reports_dir: String,
    pub webhook_url: Option<String>,
    pub webhook_events: Vec<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            auto_generate: true,
            auto_upload: true,
            price_optimization: true,
            max_daily_products: 10,
            targets: DailyTargets::default(),
            niches: default_niches(),
            generation_delay: Duration::from_secs(2),
            request_delay: Duration::from_secs(1),
            products_dir: "generated_products".to_string(),
            reports_dir: "reports".to_string(),
            webhook_url: None,
            webhook_events: DEFAULT_WEBHOOK_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DailyItem {
    Ebook,
    Template(usize),
    Planner(usize),
    EmailPack,
}

impl DailyItem {
    fn label(&self) -> &'static str {
        match self {
            DailyItem::Ebook => "ebook",
            DailyItem::Template(_) => "template",
            DailyItem::Planner(_) => "planner",
            DailyItem::EmailPack => "email templates",
        }
    }
}

fn daily_plan(targets: &DailyTargets) -> Vec<DailyItem> {
    let mut plan = Vec::new();
    plan.extend((0..targets.ebooks).map(|_| DailyItem::Ebook));
    plan.extend((0..targets.templates).map(DailyItem::Template));
    plan.extend((0..targets.planners).map(DailyItem::Planner));
    plan.extend((0..targets.email_templates).map(|_| DailyItem::EmailPack));
    plan
}

/// 產生 → 上架 → 調價 → 報表 的自動化流程
pub struct AutoLauncher<L: LanguageModel, M: Marketplace, S: Storage> {
    generator: ProductGenerator<L, S>,
    uploader: BatchUploader<M, S>,
    storage: S,
    settings: LauncherSettings,
    monitor: CycleMonitor,
}

impl<L: LanguageModel, M: Marketplace, S: Storage> AutoLauncher<L, M, S> {
    pub fn new(
        generator: ProductGenerator<L, S>,
        uploader: BatchUploader<M, S>,
        storage: S,
        settings: LauncherSettings,
    ) -> Self {
        Self {
            generator,
            uploader,
            storage,
            settings,
            monitor: CycleMonitor::default(),
        }
    }

    pub fn with_monitor(mut self, monitor: CycleMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn generator(&self) -> &ProductGenerator<L, S> {
        &self.generator
    }

    pub fn uploader(&self) -> &BatchUploader<M, S> {
        &self.uploader
    }

    pub fn marketplace(&self) -> &M {
        self.uploader.marketplace()
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    /// 單一階段失敗只記錄，不中斷後續階段
    pub async fn run_daily_cycle(&self) -> CycleSummary {
        info!("🚀 Starting daily automation cycle");
        let mut summary = CycleSummary::default();

        if self.settings.auto_generate {
            match self.generate_daily_products().await {
                Ok(count) => {
                    info!("🎯 Generated {} products", count);
                    summary.generated = Some(count);
                }
                Err(e) => {
                    error!("❌ Product generation failed: {}", e);
                    summary.failed_phases.push("generate".to_string());
                }
            }
            self.monitor.log_phase("generate");
        }

        if self.settings.auto_upload {
            match self.upload_pending().await {
                Ok(report) => summary.upload = Some(report),
                Err(e) => {
                    error!("❌ Upload failed: {}", e);
                    summary.failed_phases.push("upload".to_string());
                }
            }
            self.monitor.log_phase("upload");
        }

        if self.settings.price_optimization {
            match self.optimize_prices().await {
                Ok(updates) => summary.price_updates = Some(updates),
                Err(e) => {
                    error!("❌ Price optimization failed: {}", e);
                    summary.failed_phases.push("optimize".to_string());
                }
            }
            self.monitor.log_phase("optimize");
        }

        match self.daily_report(Local::now().date_naive()).await {
            Ok(report) => summary.report = Some(report),
            Err(e) => {
                error!("❌ Report generation failed: {}", e);
                summary.failed_phases.push("report".to_string());
            }
        }
        self.monitor.log_phase("report");

        if summary.failed_phases.is_empty() {
            info!("✅ Daily automation cycle completed successfully");
        } else {
            warn!(
                "⚠️ Daily automation cycle finished with failed phases: {}",
                summary.failed_phases.join(", ")
            );
        }
        summary
    }

    pub async fn generate_daily_products(&self) -> Result<usize> {
        let niches = &self.settings.niches;
        if niches.is_empty() {
            return Err(AutomationError::ValidationError {
                message: "no niches configured for daily generation".to_string(),
            });
        }

        let plan = daily_plan(&self.settings.targets);
        let per_pack = self.settings.targets.email_templates_per_pack;
        let mut generated = 0usize;

        for (index, item) in plan.into_iter().enumerate() {
            if generated >= self.settings.max_daily_products {
                info!(
                    "🛑 Daily limit of {} products reached",
                    self.settings.max_daily_products
                );
                break;
            }

            if index > 0 && !self.settings.generation_delay.is_zero() {
                tokio::time::sleep(self.settings.generation_delay).await;
            }

            let niche = &niches[generated % niches.len()];
            let result = match item {
                DailyItem::Ebook => self.generator.generate_ebook(&niche.topic, &niche.audience).await,
                DailyItem::Template(i) => {
                    let template_type = NOTION_TEMPLATE_TYPES[i % NOTION_TEMPLATE_TYPES.len()];
                    self.generator
                        .generate_notion_template(template_type, &niche.topic)
                        .await
                }
                DailyItem::Planner(i) => {
                    let period = PLANNER_PERIODS[i % PLANNER_PERIODS.len()];
                    self.generator.generate_planner(&niche.category, period).await
                }
                DailyItem::EmailPack => {
                    self.generator
                        .generate_email_templates(&niche.category, per_pack)
                        .await
                }
            };

            match result {
                Ok(product) => {
                    generated += 1;
                    info!("✅ Generated {}: {}", item.label(), product.title);
                }
                Err(e) => error!("❌ Failed to generate {}: {}", item.label(), e),
            }
        }

        Ok(generated)
    }

    pub async fn upload_pending(&self) -> Result<UploadReport> {
        let report = self.uploader.upload_products_from_directory().await?;
        info!(
            "📦 Upload results: {} success, {} failed",
            report.success, report.failed
        );
        Ok(report)
    }

    /// 偶數小時產生電子書，奇數小時產生 Notion 範本
    pub async fn mini_generation_cycle(&self, hour: u32) -> Result<Product> {
        info!("🔄 Running mini generation cycle");

        let niches = &self.settings.niches;
        if niches.is_empty() {
            return Err(AutomationError::ValidationError {
                message: "no niches configured for mini generation".to_string(),
            });
        }

        let niche = &niches[hour as usize % niches.len()];
        let product = if hour % 2 == 0 {
            self.generator.generate_ebook(&niche.topic, &niche.audience).await?
        } else {
            self.generator
                .generate_notion_template("productivity template", &niche.topic)
                .await?
        };

        info!("✅ Mini-cycle generated: {}", product.title);
        Ok(product)
    }

    async fn auto_generated_listings(&self) -> Result<Vec<Listing>> {
        let listings = self.marketplace().list_products().await?;
        Ok(listings
            .into_iter()
            .filter(Listing::is_auto_generated)
            .collect())
    }

    /// 回傳實際調整價格的商品數
    pub async fn optimize_prices(&self) -> Result<usize> {
        info!("💰 Starting price optimization");

        let listings = self.auto_generated_listings().await?;
        let mut updates = 0usize;

        for (index, listing) in listings.iter().enumerate() {
            if index > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            let analytics = match self.marketplace().product_analytics(&listing.id).await {
                Ok(analytics) => analytics,
                Err(e) => {
                    warn!("⚠️ No analytics for {}: {}", listing.id, e);
                    continue;
                }
            };

            let Some(new_price) = optimize_price(&analytics, listing.price) else {
                continue;
            };

            match self.marketplace().update_price(&listing.id, new_price).await {
                Ok(()) => {
                    let direction = if new_price < listing.price {
                        "Reduced"
                    } else {
                        "Increased"
                    };
                    info!(
                        "💰 {} price for {}: {} → {}",
                        direction, listing.title, listing.price, new_price
                    );
                    updates += 1;
                }
                Err(e) => warn!("⚠️ Price update for {} failed: {}", listing.id, e),
            }
        }

        Ok(updates)
    }

    pub async fn daily_report(&self, today: NaiveDate) -> Result<DailyReport> {
        info!("📊 Generating daily report");

        let listings = self.auto_generated_listings().await?;
        let mut total_sales = 0u64;
        let mut revenue_cents = 0u64;

        for listing in &listings {
            match self.marketplace().product_analytics(&listing.id).await {
                Ok(analytics) => {
                    total_sales += analytics.purchases;
                    revenue_cents += analytics.revenue;
                }
                Err(e) => warn!("⚠️ No analytics for {}: {}", listing.id, e),
            }
        }

        let stamp = today.format("%Y%m%d").to_string();
        let generated_today = self
            .storage
            .list_files(&self.settings.products_dir, "json")
            .await?
            .iter()
            .filter(|path| path.rsplit('/').next().is_some_and(|name| name.contains(&stamp)))
            .count();

        let report = DailyReport {
            date: today.format("%Y-%m-%d").to_string(),
            total_products: listings.len(),
            total_sales,
            total_revenue: revenue_cents as f64 / 100.0,
            average_price: if total_sales > 0 {
                revenue_cents as f64 / total_sales as f64 / 100.0
            } else {
                0.0
            },
            generated_today,
        };

        let reports_dir = self.settings.reports_dir.trim_end_matches('/');
        let report_path = format!("{}/daily_report_{}.json", reports_dir, stamp);
        self.storage
            .write_file(&report_path, &serde_json::to_vec_pretty(&report)?)
            .await?;
        self.append_history(&format!("{}/{}", reports_dir, DAILY_CSV), &report)
            .await?;

        info!(
            "📊 Report saved: ${:.2} revenue, {} sales",
            report.total_revenue, report.total_sales
        );
        Ok(report)
    }

    async fn append_history(&self, path: &str, report: &DailyReport) -> Result<()> {
        let first_row = !self.storage.exists(path).await;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(first_row)
            .from_writer(Vec::new());
        writer.serialize(report)?;
        let row = writer
            .into_inner()
            .map_err(|e| AutomationError::ProcessingError {
                message: format!("failed to flush report row: {}", e),
            })?;

        self.storage.append_file(path, &row).await
    }

    /// 取前 10 個自動商品的數據，依比例推估全部
    pub async fn performance_summary(&self) -> Result<PerformanceSummary> {
        let listings = self.auto_generated_listings().await?;

        let mut summary = PerformanceSummary {
            total_products: listings.len(),
            estimated_sales: 0.0,
            estimated_revenue: 0.0,
            last_updated: Local::now(),
        };
        if listings.is_empty() {
            return Ok(summary);
        }

        let mut sales = 0u64;
        let mut revenue_cents = 0u64;
        let sampled = listings.len().min(SUMMARY_SAMPLE_SIZE);
        for listing in listings.iter().take(sampled) {
            match self.marketplace().product_analytics(&listing.id).await {
                Ok(analytics) => {
                    sales += analytics.purchases;
                    revenue_cents += analytics.revenue;
                }
                Err(e) => warn!("⚠️ No analytics for {}: {}", listing.id, e),
            }
        }

        let factor = listings.len() as f64 / sampled as f64;
        summary.estimated_sales = sales as f64 * factor;
        summary.estimated_revenue = revenue_cents as f64 / 100.0 * factor;
        Ok(summary)
    }

    pub async fn setup_webhooks(&self) -> Result<String> {
        let url = self
            .settings
            .webhook_url
            .clone()
            .ok_or_else(|| AutomationError::MissingConfigError {
                field: "whop.webhook_url".to_string(),
            })?;

        let webhook_id = self
            .marketplace()
            .create_webhook(&WebhookRequest {
                url,
                events: self.settings.webhook_events.clone(),
                active: true,
            })
            .await?;

        info!("🔗 Webhooks configured: {}", webhook_id);
        Ok(webhook_id)
    }

    pub async fn launch_membership(&self, request: &MembershipRequest) -> Result<CreatedListing> {
        let created = self
            .marketplace()
            .create_membership(&membership_listing(request))
            .await?;
        info!("🎟️ Membership created: {} ({})", request.title, created.id);
        Ok(created)
    }

    async fn run_job(&self, kind: JobKind) -> Result<()> {
        match kind {
            JobKind::DailyCycle => {
                let summary = self.run_daily_cycle().await;
                if summary.failed_phases.is_empty() {
                    Ok(())
                } else {
                    Err(AutomationError::ProcessingError {
                        message: format!("failed phases: {}", summary.failed_phases.join(", ")),
                    })
                }
            }
            JobKind::MiniGeneration => self
                .mini_generation_cycle(Local::now().hour())
                .await
                .map(|_| ()),
            JobKind::PriceOptimization => self.optimize_prices().await.map(|_| ()),
            JobKind::Upload => self.upload_pending().await.map(|_| ()),
        }
    }

    /// 先跑一次每日流程，之後依排程執行直到 `shutdown` 完成
    pub async fn run_continuous<Sh>(&self, schedule: &mut Schedule, timing: LoopTiming, shutdown: Sh)
    where
        Sh: Future<Output = ()>,
    {
        info!("🎆 Starting continuous automation system");
        tokio::pin!(shutdown);

        tokio::select! {
            _ = &mut shutdown => {
                info!("🛑 Automation stopped by user during the initial daily cycle");
                return;
            }
            _ = self.run_daily_cycle() => {}
        }

        let completed = run_loop(schedule, timing, &mut shutdown, |kind| self.run_job(kind)).await;
        info!("👋 Continuous automation finished after {} scheduled jobs", completed);
    }
}
