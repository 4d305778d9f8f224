use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Marketplace rejected {action} (HTTP {status}): {body}")]
    MarketplaceError {
        action: String,
        status: u16,
        body: String,
    },

    #[error("Language model request failed (HTTP {status}): {body}")]
    ModelError { status: u16, body: String },

    #[error("Product generation failed: {message}")]
    GenerationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, AutomationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Marketplace,
    Generation,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AutomationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AutomationError::ConfigError { .. }
            | AutomationError::MissingConfigError { .. }
            | AutomationError::InvalidConfigValueError { .. }
            | AutomationError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            AutomationError::ApiError(_) => ErrorCategory::Network,
            AutomationError::MarketplaceError { .. } => ErrorCategory::Marketplace,
            AutomationError::ModelError { .. } | AutomationError::GenerationError { .. } => {
                ErrorCategory::Generation
            }
            AutomationError::IoError(_) | AutomationError::ZipError(_) => ErrorCategory::Storage,
            AutomationError::CsvError(_)
            | AutomationError::SerializationError(_)
            | AutomationError::ProcessingError { .. }
            | AutomationError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AutomationError::ConfigError { .. }
            | AutomationError::MissingConfigError { .. }
            | AutomationError::InvalidConfigValueError { .. }
            | AutomationError::ConfigValidationError { .. } => ErrorSeverity::Critical,
            AutomationError::IoError(_) | AutomationError::ZipError(_) => ErrorSeverity::Critical,
            _ if self.is_retryable() => ErrorSeverity::Medium,
            AutomationError::ValidationError { .. } => ErrorSeverity::Low,
            _ => ErrorSeverity::High,
        }
    }

    /// 429 與 5xx 以及連線層面的錯誤可以重試
    pub fn is_retryable(&self) -> bool {
        match self {
            AutomationError::ApiError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map(|s| s.as_u16() == 429 || s.is_server_error()).unwrap_or(false)
            }
            AutomationError::MarketplaceError { status, .. }
            | AutomationError::ModelError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AutomationError::MissingConfigError { .. } => {
                "Set the missing value in config/automation.toml or .env (run whop-setup to create them)"
            }
            AutomationError::ConfigError { .. }
            | AutomationError::InvalidConfigValueError { .. }
            | AutomationError::ConfigValidationError { .. } => {
                "Check config/automation.toml for typos and invalid values"
            }
            AutomationError::ApiError(_) => "Check your network connection and try again",
            AutomationError::MarketplaceError { status: 401 | 403, .. } => {
                "Verify WHOP_API_KEY and WHOP_COMPANY_ID"
            }
            AutomationError::MarketplaceError { .. } => {
                "Inspect logs/whop_api_*.log for the rejected payload"
            }
            AutomationError::ModelError { status: 401, .. } => "Verify OPENAI_API_KEY",
            AutomationError::ModelError { .. } | AutomationError::GenerationError { .. } => {
                "Retry later or switch to a different model in the [openai] section"
            }
            AutomationError::IoError(_) | AutomationError::ZipError(_) => {
                "Check that the working directories exist and are writable"
            }
            AutomationError::CsvError(_)
            | AutomationError::SerializationError(_)
            | AutomationError::ProcessingError { .. }
            | AutomationError::ValidationError { .. } => {
                "Inspect the product files in generated_products/ for malformed data"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Marketplace => format!("Whop API problem: {}", self),
            ErrorCategory::Generation => format!("AI generation problem: {}", self),
            ErrorCategory::Storage => format!("File system problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
        }
    }

    /// CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_error_retry_classification() {
        let throttled = AutomationError::MarketplaceError {
            action: "create_product".to_string(),
            status: 429,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert_eq!(throttled.severity(), ErrorSeverity::Medium);
        assert_eq!(throttled.exit_code(), 2);

        let rejected = AutomationError::MarketplaceError {
            action: "create_product".to_string(),
            status: 422,
            body: "bad price".to_string(),
        };
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.severity(), ErrorSeverity::High);
        assert_eq!(rejected.category(), ErrorCategory::Marketplace);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = AutomationError::MissingConfigError {
            field: "whop.api_key".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
        assert!(err.recovery_suggestion().contains("whop-setup"));
    }

    #[test]
    fn test_model_server_error_is_retryable() {
        let err = AutomationError::ModelError {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Generation);
    }
}
