use benefit_etl::config::toml_config::TomlConfig;
use benefit_etl::core::{ConfigProvider, Pipeline};
use benefit_etl::utils::error::ErrorSeverity;
use benefit_etl::utils::{logger, validation::Validate};
use benefit_etl::{BenefitPipeline, EtlEngine, LocalStorage, RunOutcome, TeamCode};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "benefit-etl driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the team code from config
    #[arg(long, value_enum)]
    team: Option<TeamCode>,

    /// Dry run - read the inputs and report, without writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("🚀 Starting TOML-based benefit ETL");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(team) = args.team {
        config.parameters.team = team;
        tracing::info!("🔧 Team overridden to: {}", team);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = BenefitPipeline::new(storage, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No output will be written");
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(RunOutcome::Written { path, records }) => {
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ {} records written", records);
            println!("📁 Output saved to: {}", path);
        }
        Ok(RunOutcome::Empty) => {
            println!("ℹ️ No records passed the filters; no output file was produced.");
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let params = config.parameters();

    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    if !config.pipeline.description.is_empty() {
        println!("  Description: {}", config.pipeline.description);
    }
    println!("  Inputs: {}", config.input_files().join(", "));
    if !config.margin_files().is_empty() {
        println!("  Margin files: {}", config.margin_files().join(", "));
    }
    println!("  Output: {}", config.output_path());
    println!("  Team: {}", params.team);
    println!("  Commission: {}%", params.commission_percent);
    println!("  Minimum commission: R$ {:.2}", params.min_commission);

    if let Some(ceiling) = params.margin_ceiling {
        println!("  Margin ceiling: R$ {:.2}", ceiling);
    }
    if params.require_positive_balance {
        println!("  Requires positive Saldo_Devedor");
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(
    pipeline: &BenefitPipeline<LocalStorage, TomlConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let extracted = pipeline.extract().await?;
    for report in &extracted.reports {
        match &report.error {
            Some(error) => println!("  ❌ {} ({:?}): {}", report.file, report.role, error),
            None => {
                println!(
                    "  📄 {} ({:?}): {} rows, delimiter '{}'",
                    report.file,
                    report.role,
                    report.rows_read,
                    report.delimiter.unwrap_or(',')
                );
                if !report.missing_columns.is_empty() {
                    println!("     ⚠️ missing columns: {}", report.missing_columns.join(", "));
                }
            }
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
