use crate::domain::model::{ProductAnalytics, ProductKind};
use crate::utils::error::{AutomationError, Result};

/// 各類商品的建議售價（美元）
fn base_price(kind: ProductKind) -> u32 {
    match kind {
        ProductKind::Ebook => 15,
        ProductKind::NotionTemplate => 25,
        ProductKind::DigitalPlanner => 20,
        ProductKind::EmailTemplates => 3,
        ProductKind::Course => 100,
        ProductKind::Bundle => 50,
        ProductKind::Membership => 20,
    }
}

/// Email 範本按件計價；其他商品內容超過 5 單位時乘 1.5
pub fn suggested_price(kind: ProductKind, quantity: usize) -> u32 {
    let base = base_price(kind);

    if kind == ProductKind::EmailTemplates {
        return base * quantity as u32;
    }

    if quantity > 5 {
        return base * 3 / 2;
    }

    base
}

pub fn to_cents(dollars: u32) -> u64 {
    dollars as u64 * 100
}

/// 手動設定的價格必須大於零
pub fn manual_price(cents: u64) -> Result<u64> {
    if cents == 0 {
        return Err(AutomationError::ValidationError {
            message: "Price must be greater than zero".to_string(),
        });
    }
    Ok(cents)
}

/// 高瀏覽低轉換降價 20%，高轉換 (>10%) 漲價 20%
pub fn optimize_price(analytics: &ProductAnalytics, current_cents: u64) -> Option<u64> {
    let ProductAnalytics {
        views, purchases, ..
    } = *analytics;

    let new_price = if views > 100 && purchases < 5 {
        current_cents * 4 / 5
    } else if views > 50 && purchases > 10 && (purchases as f64 / views as f64) > 0.1 {
        current_cents * 6 / 5
    } else {
        return None;
    };

    (new_price != current_cents).then_some(new_price)
}
