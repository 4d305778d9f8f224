use crate::adapters::openai::DEFAULT_OPENAI_URL;
use crate::adapters::whop::DEFAULT_WHOP_URL;
use crate::core::generator::{DEFAULT_FAST_MODEL, DEFAULT_QUALITY_MODEL};
use crate::core::launcher::{LauncherSettings, DEFAULT_WEBHOOK_EVENTS};
use crate::core::scheduler::{LoopTiming, ScheduleSettings};
use crate::domain::model::{default_niches, DailyTargets, Niche};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AutomationError, Result};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    is_unresolved_placeholder, validate_credential, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_time_of_day, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/automation.toml";

/// `whop-setup` 寫出的預設設定檔
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# whop-autopilot configuration
# ${VAR} placeholders are replaced from the environment (.env is loaded first)

[automation]
auto_generate = true
auto_upload = true
price_optimization = true
max_daily_products = 10
generation_delay_secs = 2
request_delay_secs = 1
upload_delay_secs = 1

[targets]
ebooks = 2
templates = 3
planners = 1
email_templates = 1
email_templates_per_pack = 5

[schedule]
daily_run_at = "09:00"
mini_generation_every_hours = 2
price_optimization_at = "15:00"
upload_every_hours = 3
poll_interval_secs = 60
error_backoff_secs = 300

[openai]
api_key = "${OPENAI_API_KEY}"
base_url = "https://api.openai.com/v1"
quality_model = "gpt-4"
fast_model = "gpt-3.5-turbo"
timeout_secs = 120
retry_attempts = 3
retry_delay_secs = 2

[whop]
api_key = "${WHOP_API_KEY}"
company_id = "${WHOP_COMPANY_ID}"
base_url = "https://api.whop.com/api/v5"
webhook_url = "${WEBHOOK_URL}"
timeout_secs = 30

[paths]
products_dir = "generated_products"
output_dir = "output"
reports_dir = "reports"
logs_dir = "logs"
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub automation: AutomationSection,
    pub targets: DailyTargets,
    pub schedule: ScheduleSection,
    pub openai: OpenAiSection,
    pub whop: WhopSection,
    pub paths: PathsSection,
    pub niches: Option<Vec<Niche>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSection {
    pub auto_generate: bool,
    pub auto_upload: bool,
    pub price_optimization: bool,
    pub max_daily_products: usize,
    pub generation_delay_secs: u64,
    pub request_delay_secs: u64,
    pub upload_delay_secs: u64,
    pub monitor: bool,
}

impl Default for AutomationSection {
    fn default() -> Self {
        Self {
            auto_generate: true,
            auto_upload: true,
            price_optimization: true,
            max_daily_products: 10,
            generation_delay_secs: 2,
            request_delay_secs: 1,
            upload_delay_secs: 1,
            monitor: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub daily_run_at: String,
    pub mini_generation_every_hours: u32,
    pub price_optimization_at: String,
    pub upload_every_hours: u32,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            daily_run_at: "09:00".to_string(),
            mini_generation_every_hours: 2,
            price_optimization_at: "15:00".to_string(),
            upload_every_hours: 3,
            poll_interval_secs: 60,
            error_backoff_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSection {
    pub api_key: String,
    pub base_url: String,
    pub quality_model: String,
    pub fast_model: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for OpenAiSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            quality_model: DEFAULT_QUALITY_MODEL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            timeout_secs: 120,
            retry_attempts: 3,
            retry_delay_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhopSection {
    pub api_key: String,
    pub company_id: String,
    pub base_url: String,
    pub webhook_url: Option<String>,
    pub webhook_events: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for WhopSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            company_id: String::new(),
            base_url: DEFAULT_WHOP_URL.to_string(),
            webhook_url: None,
            webhook_events: DEFAULT_WEBHOOK_EVENTS.iter().map(|e| e.to_string()).collect(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub products_dir: String,
    pub output_dir: String,
    pub reports_dir: String,
    pub logs_dir: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            products_dir: "generated_products".to_string(),
            output_dir: "output".to_string(),
            reports_dir: "reports".to_string(),
            logs_dir: "logs".to_string(),
        }
    }
}

/// 憑證欄位與對應的環境變數
const CREDENTIAL_ENV: [(&str, &str); 4] = [
    ("openai.api_key", "OPENAI_API_KEY"),
    ("whop.api_key", "WHOP_API_KEY"),
    ("whop.company_id", "WHOP_COMPANY_ID"),
    ("whop.webhook_url", "WEBHOOK_URL"),
];

fn is_unset(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || is_unresolved_placeholder(trimmed)
}

impl AutomationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AutomationError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AutomationError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WHOP_API_KEY})；未設定的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AutomationError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 檔案存在就讀檔，否則使用預設值；兩者都會以環境變數補齊憑證
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            info!("⚙️ Loading configuration from {}", path.display());
            Self::from_file(path)?
        } else {
            info!(
                "⚙️ No configuration file at {}, using defaults",
                path.display()
            );
            Self::default()
        };

        Ok(config.with_env_credentials(|name| std::env::var(name).ok()))
    }

    /// 未設定的憑證改用 `lookup` 取得的環境值
    pub fn with_env_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, env_name) in CREDENTIAL_ENV {
            let Some(value) = lookup(env_name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match field {
                "openai.api_key" if is_unset(&self.openai.api_key) => self.openai.api_key = value,
                "whop.api_key" if is_unset(&self.whop.api_key) => self.whop.api_key = value,
                "whop.company_id" if is_unset(&self.whop.company_id) => {
                    self.whop.company_id = value
                }
                "whop.webhook_url" if self.webhook_url().is_none() => {
                    self.whop.webhook_url = Some(value)
                }
                _ => {}
            }
        }
        self
    }

    /// 驗證配置的合理性（不含憑證）
    pub fn validate_config(&self) -> Result<()> {
        validate_url("openai.base_url", &self.openai.base_url)?;
        validate_url("whop.base_url", &self.whop.base_url)?;
        if let Some(url) = self.webhook_url() {
            validate_url("whop.webhook_url", url)?;
        }

        validate_non_empty_string("openai.quality_model", &self.openai.quality_model)?;
        validate_non_empty_string("openai.fast_model", &self.openai.fast_model)?;
        validate_range("openai.retry_attempts", self.openai.retry_attempts, 1, 10)?;
        validate_positive_number("openai.timeout_secs", self.openai.timeout_secs, 1)?;
        validate_positive_number("whop.timeout_secs", self.whop.timeout_secs, 1)?;

        validate_path("paths.products_dir", &self.paths.products_dir)?;
        validate_path("paths.output_dir", &self.paths.output_dir)?;
        validate_path("paths.reports_dir", &self.paths.reports_dir)?;
        validate_path("paths.logs_dir", &self.paths.logs_dir)?;

        validate_range(
            "targets.email_templates_per_pack",
            self.targets.email_templates_per_pack,
            1,
            50,
        )?;

        self.schedule_settings()?;
        validate_positive_number(
            "schedule.poll_interval_secs",
            self.schedule.poll_interval_secs,
            1,
        )?;

        if self.niches.as_ref().is_some_and(|n| n.is_empty()) {
            return Err(AutomationError::InvalidConfigValueError {
                field: "niches".to_string(),
                value: "[]".to_string(),
                reason: "At least one niche is required".to_string(),
            });
        }

        Ok(())
    }

    pub fn require_model_credentials(&self) -> Result<&str> {
        validate_credential("openai.api_key", &self.openai.api_key)
    }

    /// 回傳 (api_key, company_id)
    pub fn require_marketplace_credentials(&self) -> Result<(&str, &str)> {
        let api_key = validate_credential("whop.api_key", &self.whop.api_key)?;
        let company_id = validate_credential("whop.company_id", &self.whop.company_id)?;
        Ok((api_key, company_id))
    }

    /// 空字串或未解析的佔位符視為未設定
    pub fn webhook_url(&self) -> Option<&str> {
        self.whop
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !is_unset(url))
    }

    pub fn schedule_settings(&self) -> Result<ScheduleSettings> {
        validate_positive_number(
            "schedule.mini_generation_every_hours",
            self.schedule.mini_generation_every_hours as u64,
            1,
        )?;
        validate_positive_number(
            "schedule.upload_every_hours",
            self.schedule.upload_every_hours as u64,
            1,
        )?;

        Ok(ScheduleSettings {
            daily_cycle_at: validate_time_of_day("schedule.daily_run_at", &self.schedule.daily_run_at)?,
            mini_generation_every_hours: self.schedule.mini_generation_every_hours,
            price_optimization_at: validate_time_of_day(
                "schedule.price_optimization_at",
                &self.schedule.price_optimization_at,
            )?,
            upload_every_hours: self.schedule.upload_every_hours,
        })
    }

    pub fn loop_timing(&self) -> LoopTiming {
        LoopTiming {
            poll_interval: Duration::from_secs(self.schedule.poll_interval_secs.max(1)),
            error_backoff: Duration::from_secs(self.schedule.error_backoff_secs),
        }
    }

    pub fn model_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.openai.retry_attempts,
            Duration::from_secs(self.openai.retry_delay_secs),
        )
    }

    pub fn niches(&self) -> Vec<Niche> {
        self.niches.clone().unwrap_or_else(default_niches)
    }

    pub fn upload_delay(&self) -> Duration {
        Duration::from_secs(self.automation.upload_delay_secs)
    }

    pub fn launcher_settings(&self) -> LauncherSettings {
        LauncherSettings {
            auto_generate: self.automation.auto_generate,
            auto_upload: self.automation.auto_upload,
            price_optimization: self.automation.price_optimization,
            max_daily_products: self.automation.max_daily_products,
            targets: self.targets,
            niches: self.niches(),
            generation_delay: Duration::from_secs(self.automation.generation_delay_secs),
            request_delay: Duration::from_secs(self.automation.request_delay_secs),
            products_dir: self.paths.products_dir.clone(),
            reports_dir: self.paths.reports_dir.clone(),
            webhook_url: self.webhook_url().map(str::to_string),
            webhook_events: self.whop.webhook_events.clone(),
        }
    }
}

impl ConfigProvider for AutomationConfig {
    fn products_dir(&self) -> &str {
        &self.paths.products_dir
    }

    fn output_dir(&self) -> &str {
        &self.paths.output_dir
    }

    fn reports_dir(&self) -> &str {
        &self.paths.reports_dir
    }

    fn logs_dir(&self) -> &str {
        &self.paths.logs_dir
    }
}

impl Validate for AutomationConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
