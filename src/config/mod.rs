pub mod toml_config;

pub use toml_config::{AutomationConfig, DEFAULT_CONFIG_PATH, DEFAULT_CONFIG_TEMPLATE};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "whop-autopilot")]
#[command(about = "Generate PLR digital products and sell them on Whop on autopilot")]
pub struct CliConfig {
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate products with the language model
    #[command(subcommand)]
    Generate(GenerateCommand),
    /// Upload pending product documents to Whop
    Upload,
    /// Adjust prices of auto-generated listings from their analytics
    Optimize,
    /// Write today's report
    Report,
    /// Run one full daily cycle
    Run,
    /// Run continuously on the configured schedule
    Daemon,
    /// Register the configured webhook
    Webhooks,
    /// Show the estimated performance summary
    Summary,
    /// List products on Whop
    List,
    /// Show analytics for one product
    Analytics { product_id: String },
    /// Set the price of one product (in cents)
    Price { product_id: String, cents: u64 },
    /// Create a membership listing
    Membership {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price_cents: Option<u64>,
        #[arg(long)]
        billing_period: Option<String>,
        #[arg(long, value_delimiter = ',')]
        apps: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum GenerateCommand {
    Ebook {
        topic: String,
        #[arg(long, default_value = "general")]
        audience: String,
    },
    Notion {
        template_type: String,
        use_case: String,
    },
    Planner {
        planner_type: String,
        #[arg(long, default_value = "monthly")]
        period: String,
    },
    Emails {
        industry: String,
        #[arg(long, default_value = "10")]
        count: usize,
    },
    /// Ebook + Notion template (+ planner) for each demo niche
    Batch,
}

#[cfg(feature = "cli")]
impl Command {
    /// 只需要模型憑證的指令
    pub fn needs_model(&self) -> bool {
        matches!(
            self,
            Command::Generate(_) | Command::Run | Command::Daemon
        )
    }

    pub fn needs_marketplace(&self) -> bool {
        !matches!(self, Command::Generate(_))
    }
}
