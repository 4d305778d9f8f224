use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use whop_autopilot::config::{AutomationConfig, DEFAULT_CONFIG_PATH, DEFAULT_CONFIG_TEMPLATE};
use whop_autopilot::utils::logger;

const WORKING_DIRECTORIES: [&str; 5] = ["generated_products", "output", "logs", "reports", "config"];

#[derive(Parser)]
#[command(name = "whop-setup")]
#[command(about = "Prepare directories, credentials and configuration for whop-autopilot")]
struct Args {
    /// OpenAI API key (for AI generation)
    #[arg(long)]
    openai_key: Option<String>,

    /// Whop API key
    #[arg(long)]
    whop_key: Option<String>,

    /// Whop company id
    #[arg(long)]
    company_id: Option<String>,

    /// Optional webhook URL for notifications
    #[arg(long)]
    webhook_url: Option<String>,

    /// Do not prompt for missing values
    #[arg(long)]
    non_interactive: bool,

    /// Directory to set up
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    println!("🚀 WHOP AUTOPILOT SETUP");
    println!();

    println!("🛠  Step 1: Creating working directories...");
    for directory in WORKING_DIRECTORIES {
        std::fs::create_dir_all(args.dir.join(directory))?;
        println!("✅ Directory ready: {}", directory);
    }

    println!();
    println!("🔑 Step 2: Configuring API credentials...");
    let env_path = args.dir.join(".env");
    if has_api_keys(&env_path)? {
        println!("✅ API keys already configured in .env");
    } else {
        let credentials = collect_credentials(&args)?;
        std::fs::write(&env_path, env_file_contents(&credentials))?;
        println!("✅ Created .env");
        println!("⚠️  Keep your .env file secure and never share it publicly!");
    }

    println!();
    println!("⚙️  Step 3: Writing default configuration...");
    let config_path = args.dir.join(DEFAULT_CONFIG_PATH);
    if write_default_config(&config_path)? {
        println!("✅ Created {}", DEFAULT_CONFIG_PATH);
    } else {
        println!("✅ Found existing {}", DEFAULT_CONFIG_PATH);
    }

    println!();
    println!("🧪 Step 4: Checking credentials...");
    if let Err(e) = dotenvy::from_path(&env_path) {
        tracing::warn!("⚠️ Could not load {}: {}", env_path.display(), e);
    }
    let all_resolved = match AutomationConfig::load(&config_path) {
        Ok(config) => report_credentials(&config),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            false
        }
    };

    show_next_steps(all_resolved);
    Ok(())
}

#[derive(Debug)]
struct Credentials {
    openai_key: String,
    whop_key: String,
    company_id: String,
    webhook_url: String,
}

fn has_api_keys(env_path: &Path) -> io::Result<bool> {
    if !env_path.exists() {
        return Ok(false);
    }
    println!("✅ Found existing .env file");
    let content = std::fs::read_to_string(env_path)?;
    Ok(content.contains("OPENAI_API_KEY") && content.contains("WHOP_API_KEY"))
}

fn collect_credentials(args: &Args) -> io::Result<Credentials> {
    if !args.non_interactive {
        println!("(You can always update these later in the .env file)");
    }

    let ask = |given: &Option<String>, label: &str| -> io::Result<String> {
        match given {
            Some(value) => Ok(value.trim().to_string()),
            None if args.non_interactive => Ok(String::new()),
            None => prompt(label),
        }
    };

    Ok(Credentials {
        openai_key: ask(&args.openai_key, "OpenAI API Key (for AI generation)")?,
        whop_key: ask(&args.whop_key, "WHOP API Key (get from https://dev.whop.com)")?,
        company_id: ask(&args.company_id, "WHOP Company ID")?,
        webhook_url: ask(&args.webhook_url, "Webhook URL (optional)")?,
    })
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn env_file_contents(credentials: &Credentials) -> String {
    format!(
        "# whop-autopilot API configuration\n\
         \n\
         # OpenAI API (for AI product generation)\n\
         OPENAI_API_KEY={}\n\
         \n\
         # Whop API (for marketplace integration)\n\
         WHOP_API_KEY={}\n\
         WHOP_COMPANY_ID={}\n\
         \n\
         # Optional: webhook URL for notifications\n\
         WEBHOOK_URL={}\n",
        credentials.openai_key, credentials.whop_key, credentials.company_id, credentials.webhook_url
    )
}

/// 既有的配置檔不覆寫；回傳是否新建
fn write_default_config(config_path: &Path) -> io::Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(true)
}

fn report_credentials(config: &AutomationConfig) -> bool {
    let checks = [
        ("OpenAI API key", config.require_model_credentials().is_ok()),
        ("Whop API key / company id", config.require_marketplace_credentials().is_ok()),
    ];

    for (name, resolved) in checks {
        if resolved {
            println!("✅ {} loaded", name);
        } else {
            println!("⚠️  {} not found", name);
        }
    }

    match config.webhook_url() {
        Some(url) => println!("✅ Webhook URL: {}", url),
        None => println!("ℹ️  No webhook URL configured (optional)"),
    }

    checks.iter().all(|(_, resolved)| *resolved)
}

fn show_next_steps(ready: bool) {
    println!();
    println!("{}", "=".repeat(60));
    if ready {
        println!("🎉 SETUP COMPLETE! Your Whop automation system is ready!");
    } else {
        println!("⚠️  Setup finished with missing credentials. Edit .env before running.");
    }
    println!("{}", "=".repeat(60));

    println!();
    println!("🚀 QUICK START:");
    println!("   1. 📚 Generate and upload products now:");
    println!("      whop-autopilot run");
    println!("   2. 🔄 Start 24/7 automation:");
    println!("      whop-autopilot daemon");
    println!("   3. 📊 Check performance:");
    println!("      whop-autopilot summary");

    println!();
    println!("🔧 CONFIGURATION:");
    println!("   - Edit {} for settings", DEFAULT_CONFIG_PATH);
    println!("   - Update .env with API keys if needed");
    println!("   - Check logs/ for system activity");
}
