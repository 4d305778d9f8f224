use chrono::{Local, Timelike};
use clap::Parser;
use std::time::Duration;
use whop_autopilot::config::{Command, GenerateCommand};
use whop_autopilot::core::pricing;
use whop_autopilot::domain::model::{demo_niches, MembershipRequest, Product};
use whop_autopilot::domain::ports::{ConfigProvider, LanguageModel, Marketplace, Storage};
use whop_autopilot::utils::{logger, monitor::CycleMonitor, retry::RetryPolicy, validation::Validate};
use whop_autopilot::{
    ActionLog, AutoLauncher, AutomationConfig, BatchUploader, CliConfig,
    LocalStorage, OpenAiClient, ProductGenerator, Result, Schedule, WhopClient,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = CliConfig::parse();

    let config = match AutomationConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    // 常駐模式另外寫入 JSON 日誌檔
    if matches!(cli.command, Command::Daemon) {
        logger::init_daemon_logger(cli.verbose, config.logs_dir())?;
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting whop-autopilot ({})", cli.config);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig, config: &AutomationConfig) -> Result<()> {
    let storage = LocalStorage::new(".".to_string());

    // 只檢查該指令實際會用到的憑證
    let model_key = if cli.command.needs_model() {
        config.require_model_credentials()?
    } else {
        config.openai.api_key.as_str()
    };
    let (whop_key, company_id) = if cli.command.needs_marketplace() {
        config.require_marketplace_credentials()?
    } else {
        (config.whop.api_key.as_str(), config.whop.company_id.as_str())
    };

    let model = OpenAiClient::new(
        &config.openai.base_url,
        model_key,
        Duration::from_secs(config.openai.timeout_secs),
    )?
    .with_retry(config.model_retry());

    let whop = WhopClient::new(
        &config.whop.base_url,
        whop_key,
        company_id,
        Duration::from_secs(config.whop.timeout_secs),
        ActionLog::new(storage.clone(), config.logs_dir()),
    )?
    .with_retry(RetryPolicy::default());

    let generator = ProductGenerator::new(model, storage.clone(), config.products_dir())
        .with_models(&config.openai.quality_model, &config.openai.fast_model);
    let uploader = BatchUploader::new(whop, storage.clone(), config.products_dir(), config.output_dir())
        .with_upload_delay(config.upload_delay());

    let monitor = CycleMonitor::new(cli.monitor || config.automation.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let launcher = AutoLauncher::new(generator, uploader, storage, config.launcher_settings())
        .with_monitor(monitor);

    dispatch(cli.command, &launcher, config).await
}

async fn dispatch<L, M, S>(
    command: Command,
    launcher: &AutoLauncher<L, M, S>,
    config: &AutomationConfig,
) -> Result<()>
where
    L: LanguageModel,
    M: Marketplace,
    S: Storage,
{
    match command {
        Command::Generate(generate) => run_generate(generate, launcher.generator()).await,
        Command::Upload => {
            let report = launcher.upload_pending().await?;
            println!(
                "✅ Uploaded {} products ({} failed, {} already uploaded)",
                report.success, report.failed, report.skipped
            );
            for product in &report.products {
                println!(
                    "   {:?}: {} {}",
                    product.status,
                    product.title,
                    product.whop_id.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Command::Optimize => {
            let updated = launcher.optimize_prices().await?;
            println!("💰 Updated {} prices", updated);
            Ok(())
        }
        Command::Report => {
            let report = launcher.daily_report(Local::now().date_naive()).await?;
            println!("📊 Daily report {}", report.date);
            println!("   Products:        {}", report.total_products);
            println!("   Sales:           {}", report.total_sales);
            println!("   Revenue:         ${:.2}", report.total_revenue);
            println!("   Average price:   ${:.2}", report.average_price);
            println!("   Generated today: {}", report.generated_today);
            Ok(())
        }
        Command::Run => {
            let summary = launcher.run_daily_cycle().await;
            println!("✅ Daily cycle finished");
            if let Some(generated) = summary.generated {
                println!("   Generated: {}", generated);
            }
            if let Some(upload) = &summary.upload {
                println!("   Uploaded:  {} ({} failed)", upload.success, upload.failed);
            }
            if let Some(updated) = summary.price_updates {
                println!("   Repriced:  {}", updated);
            }
            if !summary.failed_phases.is_empty() {
                println!("⚠️  Failed phases: {}", summary.failed_phases.join(", "));
            }
            Ok(())
        }
        Command::Daemon => {
            let now = Local::now().naive_local();
            let mut schedule = Schedule::standard(&config.schedule_settings()?, now);
            println!("🔄 Continuous automation started (hour {}). Press Ctrl+C to stop", now.hour());

            launcher
                .run_continuous(&mut schedule, config.loop_timing(), async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("⚠️ Could not listen for Ctrl+C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;
            Ok(())
        }
        Command::Webhooks => {
            let webhook_id = launcher.setup_webhooks().await?;
            println!("🔗 Webhook registered: {}", webhook_id);
            Ok(())
        }
        Command::Summary => {
            let summary = launcher.performance_summary().await?;
            println!("📈 Performance summary");
            println!("   Products:            {}", summary.total_products);
            println!("   Estimated sales:     {:.1}", summary.estimated_sales);
            println!("   Estimated revenue:   ${:.2}", summary.estimated_revenue);
            println!("   Updated:             {}", summary.last_updated.format("%Y-%m-%d %H:%M"));
            Ok(())
        }
        Command::List => {
            let listings = launcher.marketplace().list_products().await?;
            println!("📦 {} products on Whop", listings.len());
            for listing in listings {
                let marker = if listing.is_auto_generated() { "🤖" } else { "  " };
                println!(
                    "{} {}  ${:.2}  {}",
                    marker,
                    listing.id,
                    listing.price as f64 / 100.0,
                    listing.title
                );
            }
            Ok(())
        }
        Command::Analytics { product_id } => {
            let analytics = launcher.marketplace().product_analytics(&product_id).await?;
            println!("📊 {}", product_id);
            println!("   Views:     {}", analytics.views);
            println!("   Purchases: {}", analytics.purchases);
            println!("   Revenue:   ${:.2}", analytics.revenue as f64 / 100.0);
            Ok(())
        }
        Command::Price { product_id, cents } => {
            let cents = pricing::manual_price(cents)?;
            launcher.marketplace().update_price(&product_id, cents).await?;
            println!("💰 {} now costs ${:.2}", product_id, cents as f64 / 100.0);
            Ok(())
        }
        Command::Membership {
            title,
            description,
            price_cents,
            billing_period,
            apps,
            roles,
        } => {
            let created = launcher
                .launch_membership(&MembershipRequest {
                    title,
                    description,
                    price_cents,
                    billing_period,
                    apps,
                    roles,
                })
                .await?;
            println!("🎟️  Membership created: {}", created.id);
            Ok(())
        }
    }
}

async fn run_generate<L: LanguageModel, S: Storage>(
    command: GenerateCommand,
    generator: &ProductGenerator<L, S>,
) -> Result<()> {
    match command {
        GenerateCommand::Ebook { topic, audience } => {
            print_product(&generator.generate_ebook(&topic, &audience).await?);
        }
        GenerateCommand::Notion {
            template_type,
            use_case,
        } => {
            print_product(&generator.generate_notion_template(&template_type, &use_case).await?);
        }
        GenerateCommand::Planner {
            planner_type,
            period,
        } => {
            print_product(&generator.generate_planner(&planner_type, &period).await?);
        }
        GenerateCommand::Emails { industry, count } => {
            print_product(&generator.generate_email_templates(&industry, count).await?);
        }
        GenerateCommand::Batch => {
            let products = generator.generate_batch(&demo_niches()).await;
            for product in &products {
                print_product(product);
            }
            println!("🎉 Generated {} products", products.len());
        }
    }

    println!("📁 Saved to '{}'", generator.products_dir());
    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "✅ {}: {} (${}, {} words)",
        product.kind(),
        product.title,
        product.suggested_price,
        product.word_count
    );
}
