use cep_race::core::ConfigProvider;
use cep_race::utils::error::ErrorSeverity;
use cep_race::utils::{logger, validation::Validate};
use cep_race::{CepError, CliConfig, RequestHandler};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting cep-race CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match config.cep.as_deref() {
        Some(cep) => lookup_once(&config, cep).await,
        None => serve(&config).await,
    };

    if let Err(e) = result {
        exit_with(e);
    }

    Ok(())
}

/// 單次查詢，結果直接印到 stdout
async fn lookup_once(config: &CliConfig, cep: &str) -> cep_race::Result<()> {
    let handler = RequestHandler::from_config(config)?;
    let winner = handler.handle(Some(cep)).await?;
    println!("{}", winner.render_text());
    Ok(())
}

async fn serve(config: &CliConfig) -> cep_race::Result<()> {
    let handler = RequestHandler::from_config(config)?;
    tracing::info!(
        "Racing {:?} with a {:?} deadline ({})",
        handler.coordinator().source_names(),
        config.deadline(),
        config.race_policy()
    );

    let listener = TcpListener::bind(config.listen_addr()).await?;
    cep_race::adapters::http_server::serve(listener, Arc::new(handler)).await
}

fn exit_with(e: CepError) -> ! {
    tracing::error!(
        "❌ cep-race failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    match &e {
        CepError::Unresolved { failures } => {
            for failure in failures {
                tracing::error!("  - {}", failure);
            }
        }
        CepError::FirstResponseFailed { failure } => tracing::error!("  - {}", failure),
        _ => {}
    }

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
