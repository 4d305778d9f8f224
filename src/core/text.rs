use crate::utils::error::{AutomationError, Result};

const CTA_PATTERNS: [&str; 5] = ["click here", "get started", "buy now", "learn more", "sign up"];

const TAG_CATEGORIES: [(&str, [&str; 5]); 6] = [
    ("business", ["business", "entrepreneur", "startup", "marketing", "sales"]),
    ("productivity", ["productivity", "organization", "planning", "efficiency", "workflow"]),
    ("health", ["health", "wellness", "fitness", "nutrition", "lifestyle"]),
    ("finance", ["finance", "money", "investing", "budgeting", "wealth"]),
    ("social media", ["social media", "content", "instagram", "tiktok", "marketing"]),
    ("real estate", ["real estate", "property", "investing", "landlord", "rental"]),
];

const GENERIC_TAGS: [&str; 5] = ["PLR", "MRR", "digital product", "template", "instant download"];

pub const MAX_TAGS: usize = 10;

/// 檔名用：小寫、空白轉底線，只保留 [a-z0-9_-]
pub fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// 每個單字首字大寫
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// 模型輸出常包在 ```json 區塊裡或前後夾雜說明文字
pub fn extract_json(text: &str) -> Result<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            if let Ok(value) = serde_json::from_str(body[..end].trim()) {
                return Ok(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = trimmed.chars().take(80).collect();
    Err(AutomationError::GenerationError {
        message: format!("model output is not valid JSON: {}", preview),
    })
}

pub fn extract_subject_line(email_content: &str) -> String {
    email_content
        .lines()
        .find(|line| line.to_lowercase().contains("subject") && line.contains(':'))
        .and_then(|line| line.split_once(':'))
        .map(|(_, subject)| subject.trim().to_string())
        .unwrap_or_else(|| "[Subject Line Not Found]".to_string())
}

pub fn extract_cta(email_content: &str) -> String {
    email_content
        .to_lowercase()
        .lines()
        .find(|line| CTA_PATTERNS.iter().any(|pattern| line.contains(pattern)))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "Get Started Today".to_string())
}

/// 依主題比對分類標籤，再補上通用標籤；去重後最多 10 個
pub fn generate_tags(content: &str) -> Vec<String> {
    let lowered = content.to_lowercase();
    let mut tags: Vec<String> = Vec::new();

    let mut push = |tag: &str| {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    };

    for (category, category_tags) in TAG_CATEGORIES.iter() {
        if category.split_whitespace().any(|word| lowered.contains(word)) {
            category_tags.iter().take(3).for_each(|tag| push(*tag));
        }
    }
    GENERIC_TAGS.iter().for_each(|tag| push(*tag));

    tags.truncate(MAX_TAGS);
    tags
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Personal Finance for Millennials"), "personal_finance_for_millennials");
        assert_eq!(slugify("30-Day Fitness / Planner!"), "30-day_fitness__planner");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("monthly"), "Monthly");
        assert_eq!(title_case("personal finance"), "Personal Finance");
    }

    #[test]
    fn test_extract_json_variants() {
        let bare = extract_json(r#"{"title": "A"}"#).unwrap();
        assert_eq!(bare["title"], "A");

        let fenced = extract_json("Here you go:\n```json\n{\"title\": \"B\"}\n```\nEnjoy").unwrap();
        assert_eq!(fenced["title"], "B");

        let embedded = extract_json("Sure! {\"title\": \"C\", \"chapters\": []} Hope it helps").unwrap();
        assert_eq!(embedded["title"], "C");

        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn test_extract_subject_line() {
        let email = "Hi team\nSubject Line: Welcome aboard, [FIRST_NAME]!\nBody";
        assert_eq!(extract_subject_line(email), "Welcome aboard, [FIRST_NAME]!");
        assert_eq!(extract_subject_line("No header"), "[Subject Line Not Found]");
    }

    #[test]
    fn test_extract_cta() {
        let email = "Hello\n  Click HERE to claim your discount  \nBye";
        assert_eq!(extract_cta(email), "click here to claim your discount");
        assert_eq!(extract_cta("nothing to see"), "Get Started Today");
    }

    #[test]
    fn test_generate_tags_matches_categories() {
        let tags = generate_tags("Personal Finance for Millennials");
        assert_eq!(
            tags,
            vec!["finance", "money", "investing", "PLR", "MRR", "digital product", "template", "instant download"]
        );
    }

    #[test]
    fn test_generate_tags_deduplicates_and_caps() {
        // business, social media and real estate all match
        let tags = generate_tags("social media business for real estate");
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags[0], "business");
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
    }
}
