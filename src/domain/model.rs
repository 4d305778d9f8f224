use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Ebook,
    NotionTemplate,
    DigitalPlanner,
    EmailTemplates,
    Course,
    Bundle,
    Membership,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Ebook => "ebook",
            ProductKind::NotionTemplate => "notion_template",
            ProductKind::DigitalPlanner => "digital_planner",
            ProductKind::EmailTemplates => "email_templates",
            ProductKind::Course => "course",
            ProductKind::Bundle => "bundle",
            ProductKind::Membership => "membership",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 產生器輸出、存放在 products 目錄中的商品文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Local>,
    #[serde(default = "default_true")]
    pub plr_rights: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrr_rights: Option<bool>,
    pub suggested_price: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub word_count: u32,
    #[serde(flatten)]
    pub details: ProductDetails,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductDetails {
    Ebook {
        #[serde(default)]
        subtitle: String,
        topic: String,
        target_audience: String,
        chapters: Vec<Chapter>,
        #[serde(default)]
        bonus_sections: Vec<serde_json::Value>,
    },
    NotionTemplate {
        template_type: String,
        use_case: String,
        #[serde(default)]
        structure: serde_json::Value,
        #[serde(default)]
        instructions: Vec<String>,
        #[serde(default)]
        preview_images: Vec<String>,
    },
    DigitalPlanner {
        planner_type: String,
        period: String,
        #[serde(default)]
        layouts: serde_json::Value,
        #[serde(default)]
        formats: Vec<String>,
        #[serde(default)]
        customizable: bool,
    },
    EmailTemplates {
        industry: String,
        template_count: usize,
        templates: Vec<EmailTemplate>,
        #[serde(default)]
        formats: Vec<String>,
    },
}

impl Product {
    pub fn kind(&self) -> ProductKind {
        match self.details {
            ProductDetails::Ebook { .. } => ProductKind::Ebook,
            ProductDetails::NotionTemplate { .. } => ProductKind::NotionTemplate,
            ProductDetails::DigitalPlanner { .. } => ProductKind::DigitalPlanner,
            ProductDetails::EmailTemplates { .. } => ProductKind::EmailTemplates,
        }
    }

    /// 缺少 MRR 旗標時視為擁有轉售權
    pub fn mrr_rights(&self) -> bool {
        self.mrr_rights.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    #[serde(rename = "type")]
    pub kind: String,
    pub subject_line: String,
    pub content: String,
    pub cta: String,
    #[serde(default)]
    pub personalization_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Niche {
    pub topic: String,
    pub audience: String,
    pub category: String,
}

impl Niche {
    pub fn new(topic: &str, audience: &str, category: &str) -> Self {
        Self {
            topic: topic.to_string(),
            audience: audience.to_string(),
            category: category.to_string(),
        }
    }
}

pub fn default_niches() -> Vec<Niche> {
    vec![
        Niche::new("Social Media Marketing Mastery", "entrepreneurs", "business"),
        Niche::new("Dropshipping Empire Blueprint", "ecommerce beginners", "business"),
        Niche::new("Real Estate Investment Guide", "investors", "finance"),
        Niche::new("Affiliate Marketing Secrets", "online marketers", "business"),
        Niche::new("Email Marketing Templates", "business owners", "marketing"),
        Niche::new("Ultimate Productivity Planner", "professionals", "productivity"),
        Niche::new("Digital Detox Challenge", "wellness seekers", "wellness"),
        Niche::new("Goal Setting Workbook", "achievers", "productivity"),
        Niche::new("Time Management Mastery", "busy professionals", "productivity"),
        Niche::new("Habit Tracker Templates", "self-improvement", "wellness"),
        Niche::new("30-Day Fitness Planner", "fitness enthusiasts", "wellness"),
        Niche::new("Meal Prep Made Simple", "health conscious", "wellness"),
        Niche::new("Mental Health Journal", "wellness seekers", "wellness"),
        Niche::new("Stress Management Guide", "professionals", "wellness"),
        Niche::new("Sleep Optimization Blueprint", "health optimizers", "wellness"),
        Niche::new("Personal Finance Tracker", "young adults", "finance"),
        Niche::new("Cryptocurrency Basics", "crypto beginners", "finance"),
        Niche::new("Retirement Planning Guide", "adults 30+", "finance"),
        Niche::new("Side Hustle Starter Kit", "income seekers", "business"),
        Niche::new("Budgeting Templates Bundle", "savers", "finance"),
    ]
}

/// 單次批量產生示範使用的題材 (topic, audience)
pub fn demo_niches() -> Vec<(String, String)> {
    [
        ("Personal Finance for Millennials", "millennials"),
        ("Social Media Marketing for Small Business", "small business owners"),
        ("Productivity Hacks for Entrepreneurs", "entrepreneurs"),
        ("Real Estate Investment Guide", "beginner investors"),
        ("Wellness and Self-Care Planner", "wellness enthusiasts"),
    ]
    .iter()
    .map(|(t, a)| (t.to_string(), a.to_string()))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyTargets {
    pub ebooks: usize,
    pub templates: usize,
    pub planners: usize,
    pub email_templates: usize,
    pub email_templates_per_pack: usize,
}

impl Default for DailyTargets {
    fn default() -> Self {
        Self {
            ebooks: 2,
            templates: 3,
            planners: 1,
            email_templates: 1,
            email_templates_per_pack: 5,
        }
    }
}

// ---- Marketplace payloads ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRequest {
    pub title: String,
    pub description: String,
    /// 以分為單位
    pub price: u64,
    #[serde(rename = "type")]
    pub listing_type: String,
    pub visibility: String,
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedListing {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingMetadata {
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub metadata: ListingMetadata,
}

impl Listing {
    pub fn is_auto_generated(&self) -> bool {
        self.metadata.auto_generated
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductAnalytics {
    pub views: u64,
    pub purchases: u64,
    /// 以分為單位
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub title: String,
    pub description: String,
    pub price_cents: Option<u64>,
    pub billing_period: Option<String>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
}

// ---- Outcomes ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whop_id: Option<String>,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub products: Vec<UploadedProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: String,
    pub total_products: usize,
    pub total_sales: u64,
    /// 美元
    pub total_revenue: f64,
    pub average_price: f64,
    pub generated_today: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_products: usize,
    pub estimated_sales: f64,
    pub estimated_revenue: f64,
    pub last_updated: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    pub generated: Option<usize>,
    pub upload: Option<UploadReport>,
    pub price_updates: Option<usize>,
    pub report: Option<DailyReport>,
    pub failed_phases: Vec<String>,
}
