use crate::core::pricing::to_cents;
use crate::domain::model::{ListingRequest, MembershipRequest, Product, ProductDetails, ProductKind};
use serde_json::{json, Map, Value};

pub const CREATED_BY: &str = "whop_autopilot";
pub const DEFAULT_DESCRIPTION: &str = "Professional digital product with PLR/MRR rights";
pub const DEFAULT_MEMBERSHIP_PRICE_CENTS: u64 = 2997;

pub fn category_for(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Ebook | ProductKind::Course => "education",
        ProductKind::NotionTemplate | ProductKind::DigitalPlanner => "productivity",
        ProductKind::EmailTemplates => "marketing",
        ProductKind::Membership => "community",
        ProductKind::Bundle => "other",
    }
}

/// 商品文件 -> Whop 上架內容
pub fn listing_for(product: &Product) -> ListingRequest {
    let kind = product.kind();

    let mut metadata = Map::new();
    metadata.insert("auto_generated".into(), Value::Bool(true));
    metadata.insert("product_type".into(), json!(kind.as_str()));
    metadata.insert("plr_rights".into(), Value::Bool(product.plr_rights));
    metadata.insert("mrr_rights".into(), Value::Bool(product.mrr_rights()));
    metadata.insert("created_by".into(), json!(CREATED_BY));
    metadata.insert("word_count".into(), json!(product.word_count));

    match &product.details {
        ProductDetails::Ebook { chapters, .. } => {
            metadata.insert("chapters".into(), json!(chapters.len()));
            metadata.insert("formats".into(), json!(["PDF", "EPUB", "DOCX"]));
        }
        ProductDetails::NotionTemplate {
            template_type,
            use_case,
            ..
        } => {
            metadata.insert("template_type".into(), json!(template_type));
            metadata.insert("use_case".into(), json!(use_case));
        }
        ProductDetails::DigitalPlanner {
            planner_type,
            period,
            formats,
            ..
        } => {
            metadata.insert("planner_type".into(), json!(planner_type));
            metadata.insert("period".into(), json!(period));
            metadata.insert("formats".into(), json!(formats));
        }
        ProductDetails::EmailTemplates { .. } => {}
    }

    let description = if product.description.trim().is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        product.description.clone()
    };

    ListingRequest {
        title: product.title.clone(),
        description,
        price: to_cents(product.suggested_price),
        listing_type: "one_time".to_string(),
        visibility: "public".to_string(),
        stock: -1,
        category: Some(category_for(kind).to_string()),
        billing_period: None,
        tags: product.tags.clone(),
        metadata,
        apps: Vec::new(),
        roles: Vec::new(),
    }
}

pub fn membership_listing(request: &MembershipRequest) -> ListingRequest {
    let mut metadata = Map::new();
    metadata.insert("auto_generated".into(), Value::Bool(true));
    metadata.insert("product_type".into(), json!(ProductKind::Membership.as_str()));
    metadata.insert("created_by".into(), json!(CREATED_BY));

    ListingRequest {
        title: request.title.clone(),
        description: request.description.clone(),
        price: request.price_cents.unwrap_or(DEFAULT_MEMBERSHIP_PRICE_CENTS),
        listing_type: "subscription".to_string(),
        visibility: "public".to_string(),
        stock: -1,
        category: None,
        billing_period: Some(
            request
                .billing_period
                .clone()
                .unwrap_or_else(|| "monthly".to_string()),
        ),
        tags: Vec::new(),
        metadata,
        apps: request.apps.clone(),
        roles: request.roles.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Chapter;
    use chrono::Local;

    fn ebook(description: &str) -> Product {
        Product {
            title: "Money Basics".to_string(),
            description: description.to_string(),
            created_at: Local::now(),
            plr_rights: true,
            mrr_rights: Some(true),
            suggested_price: 15,
            tags: vec!["finance".to_string()],
            word_count: 1200,
            details: ProductDetails::Ebook {
                subtitle: String::new(),
                topic: "Personal Finance".to_string(),
                target_audience: "millennials".to_string(),
                chapters: vec![
                    Chapter {
                        title: "One".to_string(),
                        content: "a".to_string(),
                    },
                    Chapter {
                        title: "Two".to_string(),
                        content: "b".to_string(),
                    },
                ],
                bonus_sections: vec![],
            },
        }
    }

    #[test]
    fn test_ebook_listing() {
        let listing = listing_for(&ebook("Learn money"));

        assert_eq!(listing.price, 1500);
        assert_eq!(listing.category.as_deref(), Some("education"));
        assert_eq!(listing.stock, -1);
        assert_eq!(listing.metadata["chapters"], 2);
        assert_eq!(listing.metadata["auto_generated"], true);
        assert_eq!(listing.metadata["word_count"], 1200);
        assert_eq!(listing.metadata["formats"], json!(["PDF", "EPUB", "DOCX"]));

        let payload = serde_json::to_value(&listing).unwrap();
        assert_eq!(payload["type"], "one_time");
        assert!(payload.get("billing_period").is_none());
        assert!(payload.get("apps").is_none());
    }

    #[test]
    fn test_empty_description_uses_default() {
        let listing = listing_for(&ebook("  "));
        assert_eq!(listing.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_planner_metadata() {
        let mut product = ebook("x");
        product.details = ProductDetails::DigitalPlanner {
            planner_type: "finance".to_string(),
            period: "weekly".to_string(),
            layouts: json!({}),
            formats: vec!["PDF".to_string()],
            customizable: true,
        };

        let listing = listing_for(&product);
        assert_eq!(listing.category.as_deref(), Some("productivity"));
        assert_eq!(listing.metadata["period"], "weekly");
        assert_eq!(listing.metadata["formats"], json!(["PDF"]));
        assert!(listing.metadata.get("chapters").is_none());
    }

    #[test]
    fn test_membership_defaults() {
        let listing = membership_listing(&MembershipRequest {
            title: "Inner Circle".to_string(),
            description: "Monthly drops".to_string(),
            price_cents: None,
            billing_period: None,
            apps: vec![],
            roles: vec!["member".to_string()],
        });

        assert_eq!(listing.price, DEFAULT_MEMBERSHIP_PRICE_CENTS);
        assert_eq!(listing.listing_type, "subscription");
        assert_eq!(listing.billing_period.as_deref(), Some("monthly"));
        assert_eq!(listing.metadata["product_type"], "membership");
        assert_eq!(listing.roles, vec!["member"]);
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_for(ProductKind::EmailTemplates), "marketing");
        assert_eq!(category_for(ProductKind::Membership), "community");
        assert_eq!(category_for(ProductKind::Bundle), "other");
    }
}
