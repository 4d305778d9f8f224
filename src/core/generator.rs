use crate::core::pricing::suggested_price;
use crate::core::text::{
    extract_cta, extract_json, extract_subject_line, generate_tags, slugify, title_case, word_count,
};
use crate::domain::model::{Chapter, EmailTemplate, Product, ProductDetails, ProductKind};
use crate::domain::ports::{CompletionRequest, LanguageModel, Storage};
use crate::utils::error::{AutomationError, Result};
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

pub const DEFAULT_QUALITY_MODEL: &str = "gpt-4";
pub const DEFAULT_FAST_MODEL: &str = "gpt-3.5-turbo";

pub const EMAIL_TEMPLATE_TYPES: [&str; 10] = [
    "welcome_series",
    "sales_sequence",
    "nurture_campaign",
    "abandoned_cart",
    "promotional",
    "newsletter",
    "follow_up",
    "onboarding",
    "feedback_request",
    "seasonal_campaign",
];

const PERSONALIZATION_FIELDS: [&str; 3] = ["[FIRST_NAME]", "[COMPANY]", "[PRODUCT]"];
const PLANNER_FORMATS: [&str; 4] = ["PDF", "PNG", "Notion", "GoodNotes"];
const EMAIL_FORMATS: [&str; 4] = ["HTML", "Plain Text", "Mailchimp", "ConvertKit"];

#[derive(Debug, Deserialize)]
struct EbookOutline {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    chapters: Vec<OutlineChapter>,
    #[serde(default)]
    bonus_sections: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OutlineChapter {
    #[serde(default = "untitled_chapter")]
    title: String,
    #[serde(default)]
    description: Option<String>,
}

fn untitled_chapter() -> String {
    "Untitled Chapter".to_string()
}

/// 以語言模型產生 PLR 商品並存成 JSON 文件
pub struct ProductGenerator<L: LanguageModel, S: Storage> {
    model: L,
    storage: S,
    products_dir: String,
    quality_model: String,
    fast_model: String,
}

impl<L: LanguageModel, S: Storage> ProductGenerator<L, S> {
    pub fn new(model: L, storage: S, products_dir: impl Into<String>) -> Self {
        Self {
            model,
            storage,
            products_dir: products_dir.into(),
            quality_model: DEFAULT_QUALITY_MODEL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
        }
    }

    pub fn with_models(mut self, quality: impl Into<String>, fast: impl Into<String>) -> Self {
        self.quality_model = quality.into();
        self.fast_model = fast.into();
        self
    }

    pub fn products_dir(&self) -> &str {
        &self.products_dir
    }

    async fn ask(
        &self,
        model: &str,
        prompt: String,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        self.model
            .complete(CompletionRequest {
                model: model.to_string(),
                prompt,
                temperature,
                max_tokens,
            })
            .await
    }

    /// 寫入 `<products_dir>/<stem>_<YYYYmmdd_HHMMSS>.json`，同一秒內重名時加上 `_2`、`_3`…，回傳路徑
    async fn save(&self, stem: &str, product: &Product) -> Result<String> {
        let base = format!(
            "{}/{}_{}",
            self.products_dir.trim_end_matches('/'),
            stem,
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let mut path = format!("{}.json", base);
        let mut n = 2;
        while self.storage.exists(&path).await {
            path = format!("{}_{}.json", base, n);
            n += 1;
        }
        let data = serde_json::to_vec_pretty(product)?;
        self.storage.write_file(&path, &data).await?;
        debug!("💾 Saved product document: {}", path);
        Ok(path)
    }

    pub async fn generate_ebook(&self, topic: &str, target_audience: &str) -> Result<Product> {
        info!("🤖 Generating ebook: {}", topic);

        let outline_prompt = format!(
            "Create a detailed outline for a PLR ebook about \"{topic}\" targeting {target_audience}.\n\n\
            Include:\n\
            - Compelling title\n\
            - 8-12 chapter titles\n\
            - Brief description of each chapter\n\
            - Target word count (2000-5000 words)\n\
            - 3 bonus sections\n\
            - Call-to-action ideas\n\n\
            Format as JSON with keys: title, subtitle, chapters, target_words, bonus_sections, cta_ideas"
        );
        let raw = self.ask(&self.quality_model, outline_prompt, 0.7, None).await?;
        let outline: EbookOutline = serde_json::from_value(extract_json(&raw)?)?;

        if outline.chapters.is_empty() {
            return Err(AutomationError::GenerationError {
                message: format!("ebook outline for '{}' has no chapters", topic),
            });
        }

        let mut chapters = Vec::with_capacity(outline.chapters.len());
        for chapter in &outline.chapters {
            let content = self.chapter_content(chapter, topic, target_audience).await;
            chapters.push(Chapter {
                title: chapter.title.clone(),
                content,
            });
        }

        let description = self.listing_description(&outline.title, topic).await;
        let words: usize = chapters.iter().map(|chapter| word_count(&chapter.content)).sum();

        let product = Product {
            title: outline.title,
            description,
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: Some(true),
            suggested_price: suggested_price(ProductKind::Ebook, chapters.len()),
            tags: generate_tags(topic),
            word_count: words as u32,
            details: ProductDetails::Ebook {
                subtitle: outline.subtitle.unwrap_or_default(),
                topic: topic.to_string(),
                target_audience: target_audience.to_string(),
                chapters,
                bonus_sections: outline.bonus_sections,
            },
        };

        let path = self.save(&format!("ebook_{}", slugify(topic)), &product).await?;
        info!("✅ Ebook generated: {}", path);
        Ok(product)
    }

    async fn chapter_content(&self, chapter: &OutlineChapter, topic: &str, audience: &str) -> String {
        let prompt = format!(
            "Write a comprehensive chapter for a PLR ebook about \"{topic}\" targeting {audience}.\n\n\
            Chapter: {}\n\
            Description: {}\n\n\
            Requirements:\n\
            - 800-1200 words\n\
            - Actionable advice\n\
            - Professional tone\n\
            - Include examples\n\
            - Add bullet points and subheadings\n\
            - End with key takeaways\n\n\
            Make it valuable and engaging.",
            chapter.title,
            chapter.description.as_deref().unwrap_or("No description provided"),
        );

        match self.ask(&self.fast_model, prompt, 0.7, Some(1500)).await {
            Ok(content) => content,
            Err(e) => {
                warn!("❌ Chapter '{}' failed: {}", chapter.title, e);
                format!("Chapter content for {} - [Content generation failed]", chapter.title)
            }
        }
    }

    async fn listing_description(&self, title: &str, topic: &str) -> String {
        let prompt = format!(
            "Write a compelling product description for a PLR digital product:\n\n\
            Title: {title}\n\
            Topic: {topic}\n\n\
            Include:\n\
            - Hook that grabs attention\n\
            - Key benefits and features\n\
            - What's included in the package\n\
            - PLR/MRR rights explanation\n\
            - Call-to-action\n\n\
            Keep it under 200 words, sales-focused, and professional."
        );

        match self.ask(&self.fast_model, prompt, 0.8, Some(300)).await {
            Ok(description) => description,
            Err(e) => {
                warn!("❌ Description for '{}' failed: {}", title, e);
                format!(
                    "Professional PLR digital product about {}. Includes full resell rights and ready-to-use content.",
                    topic
                )
            }
        }
    }

    pub async fn generate_notion_template(&self, template_type: &str, use_case: &str) -> Result<Product> {
        info!("📋 Generating Notion template: {} for {}", template_type, use_case);

        let prompt = format!(
            "Create a comprehensive Notion template for {template_type} designed for {use_case}.\n\n\
            Include:\n\
            - Template name and description\n\
            - Database structures with properties\n\
            - Page layouts and sections\n\
            - Formulas and automations\n\
            - Visual elements (icons, covers)\n\
            - Instructions for customization\n\
            - Use case examples\n\n\
            Make it professional and highly functional.\n\
            Format as JSON with detailed structure."
        );
        let raw = self.ask(&self.quality_model, prompt, 0.6, None).await?;
        let structure = extract_json(&raw)?;

        let title = structure
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Template", template_type));
        let description = string_field(&structure, "description");
        let instructions = structure
            .get("instructions")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(value_to_line).collect())
            .unwrap_or_default();

        let product = Product {
            title,
            description,
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: None,
            suggested_price: suggested_price(ProductKind::NotionTemplate, 1),
            tags: generate_tags(&format!("{} {}", template_type, use_case)),
            word_count: 0,
            details: ProductDetails::NotionTemplate {
                template_type: template_type.to_string(),
                use_case: use_case.to_string(),
                structure,
                instructions,
                preview_images: Vec::new(),
            },
        };

        let path = self
            .save(&format!("notion_{}", slugify(template_type)), &product)
            .await?;
        info!("✅ Notion template generated: {}", path);
        Ok(product)
    }

    pub async fn generate_planner(&self, planner_type: &str, period: &str) -> Result<Product> {
        info!("📅 Generating {} {} planner", period, planner_type);

        let prompt = format!(
            "Create a comprehensive {period} {planner_type} planner template.\n\n\
            Include:\n\
            - Cover design concepts\n\
            - Monthly/weekly/daily layouts\n\
            - Goal-setting sections\n\
            - Tracking pages\n\
            - Reflection prompts\n\
            - Customizable elements\n\
            - Print and digital versions\n\n\
            Make it visually appealing and highly functional.\n\
            Format as JSON."
        );
        let raw = self.ask(&self.quality_model, prompt, 0.6, None).await?;
        let layouts = extract_json(&raw).unwrap_or_else(|_| {
            debug!("Planner output is not JSON, keeping raw text");
            json!({ "content": raw })
        });

        let product = Product {
            title: format!("{} Planner", title_case(&format!("{} {}", period, planner_type))),
            description: string_field(&layouts, "description"),
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: None,
            suggested_price: suggested_price(ProductKind::DigitalPlanner, 1),
            tags: generate_tags(&format!("{} planner {}", planner_type, period)),
            word_count: 0,
            details: ProductDetails::DigitalPlanner {
                planner_type: planner_type.to_string(),
                period: period.to_string(),
                layouts,
                formats: PLANNER_FORMATS.iter().map(|f| f.to_string()).collect(),
                customizable: true,
            },
        };

        let path = self
            .save(
                &format!("planner_{}_{}", slugify(planner_type), slugify(period)),
                &product,
            )
            .await?;
        info!("✅ Planner generated: {}", path);
        Ok(product)
    }

    pub async fn generate_email_templates(&self, industry: &str, count: usize) -> Result<Product> {
        info!("📧 Generating {} email templates for {}", count, industry);

        let mut templates = Vec::with_capacity(count);
        for i in 0..count {
            let kind = EMAIL_TEMPLATE_TYPES[i % EMAIL_TEMPLATE_TYPES.len()];
            let prompt = format!(
                "Create a high-converting {kind} email template for {industry} businesses.\n\n\
                Include:\n\
                - Compelling subject line\n\
                - Email body with personalization\n\
                - Clear call-to-action\n\
                - Mobile-optimized format\n\
                - A/B test variations\n\n\
                Make it professional and conversion-focused."
            );

            match self.ask(&self.quality_model, prompt, 0.7, None).await {
                Ok(content) => templates.push(EmailTemplate {
                    kind: kind.to_string(),
                    subject_line: extract_subject_line(&content),
                    cta: extract_cta(&content),
                    content,
                    personalization_fields: PERSONALIZATION_FIELDS
                        .iter()
                        .map(|f| f.to_string())
                        .collect(),
                }),
                Err(e) => warn!("❌ Email template {} failed: {}", i + 1, e),
            }
        }

        if templates.is_empty() {
            return Err(AutomationError::GenerationError {
                message: format!("no email templates could be generated for {}", industry),
            });
        }

        let produced = templates.len();
        let words: usize = templates.iter().map(|t| word_count(&t.content)).sum();

        let product = Product {
            title: format!("{} {} Email Templates", produced, title_case(industry)),
            description: String::new(),
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: None,
            suggested_price: suggested_price(ProductKind::EmailTemplates, produced),
            tags: generate_tags(&format!("email templates {}", industry)),
            word_count: words as u32,
            details: ProductDetails::EmailTemplates {
                industry: industry.to_string(),
                template_count: produced,
                templates,
                formats: EMAIL_FORMATS.iter().map(|f| f.to_string()).collect(),
            },
        };

        let path = self
            .save(&format!("email_templates_{}", slugify(industry)), &product)
            .await?;
        info!("✅ Email templates generated: {}", path);
        Ok(product)
    }

    /// 每個主題各產生電子書與 Notion 範本；財務、健康、生產力主題另加月計畫表
    pub async fn generate_batch(&self, niches: &[(String, String)]) -> Vec<Product> {
        info!("🚀 Starting batch generation for {} niches", niches.len());

        let mut products = Vec::new();
        let mut failed = 0usize;

        for (topic, audience) in niches {
            info!("📚 Generating products for: {}", topic);
            let lowered = topic.to_lowercase();

            let mut record = |result: Result<Product>, what: &str| match result {
                Ok(product) => products.push(product),
                Err(e) => {
                    warn!("❌ {} for '{}' failed: {}", what, topic, e);
                    failed += 1;
                }
            };

            record(self.generate_ebook(topic, audience).await, "Ebook");

            let template_type = if lowered.contains("productivity") {
                "productivity dashboard"
            } else {
                "planning template"
            };
            record(
                self.generate_notion_template(template_type, topic).await,
                "Notion template",
            );

            if ["finance", "wellness", "productivity"]
                .iter()
                .any(|word| lowered.contains(word))
            {
                let planner_type = lowered.split_whitespace().next().unwrap_or("general");
                record(self.generate_planner(planner_type, "monthly").await, "Planner");
            }
        }

        info!(
            "🎉 Batch generation finished: {} products, {} failed",
            products.len(),
            failed
        );
        products
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn value_to_line(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
