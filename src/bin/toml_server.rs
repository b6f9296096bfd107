use cep_race::adapters::http_server;
use cep_race::config::toml_config::TomlConfig;
use cep_race::core::ConfigProvider;
use cep_race::utils::error::ErrorSeverity;
use cep_race::utils::{logger, validation::Validate};
use cep_race::RequestHandler;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "toml-server")]
#[command(about = "cep-race HTTP server with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "cep-race.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the listen address from config
    #[arg(long)]
    listen_addr: Option<String>,

    /// Show the resolved configuration without serving
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置 (日誌格式也由配置決定，所以先載入)
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.verbose_logging();
    if config.json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based cep-race server");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(listen_addr) = args.listen_addr {
        tracing::info!("🔧 Listen address overridden to: {}", listen_addr);
        config.server.listen_addr = listen_addr;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, args.dry_run);
    if args.dry_run {
        return Ok(());
    }

    let result = async {
        let handler = RequestHandler::from_config(&config)?;
        let listener = TcpListener::bind(config.listen_addr()).await?;
        http_server::serve(listener, Arc::new(handler)).await
    }
    .await;

    if let Err(e) = result {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Listen: {}", config.listen_addr());
    println!("  Deadline: {:?}", config.deadline());
    println!("  Policy: {}", config.race_policy());
    println!("  Sources:");
    for source in &config.sources {
        let marker = if source.enabled { "✅" } else { "⏸️" };
        println!("    {} {:?} -> {}", marker, source.kind, source.base_url);
    }

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
