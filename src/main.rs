use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use minipool_collector::collector::MinipoolCollector;
use minipool_collector::config::AppConfig;
use minipool_collector::formatter::JsonFormatter;
use minipool_collector::routes::create_router;
use minipool_collector::rpc::{ContractRegistry, HttpCaller};

#[derive(Parser, Debug)]
#[command(author, version, about = "Concurrent minipool state collector")]
struct Cli {
    /// YAML профиль сети
    #[arg(long, env = "MINIPOOL_PROFILE", default_value = "./profiles/local.yaml")]
    profile: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Полное описание миньпула
    Details { address: String },
    /// Статус миньпула и публичный ключ валидатора
    Status { address: String },
    /// Таблица активных миньпулов по публичному ключу валидатора
    Active,
    /// HTTP API поверх коллектора
    Serve {
        #[arg(long, env = "MINIPOOL_LISTEN_ADDR", default_value = "127.0.0.1:3000")]
        listen: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.profile)?;
    init_logging(&config);
    config.debug_config();

    let collector = Arc::new(create_collector(&config).await?);

    let outcome = run(cli.command, Arc::clone(&collector)).await;
    // Блокирующий HTTP клиент освобождаем вне асинхронного контекста
    let _ = tokio::task::spawn_blocking(move || drop(collector)).await;
    outcome
}

async fn run(command: Command, collector: Arc<MinipoolCollector>) -> Result<()> {
    match command {
        Command::Details { address } => {
            let address = parse_address(&address)?;
            let outcome = collector.details(address).await;
            print_outcome(outcome.map(|details| JsonFormatter::format_details(&details)))
        }
        Command::Status { address } => {
            let address = parse_address(&address)?;
            let outcome = collector.status(address).await;
            print_outcome(outcome.map(|status| JsonFormatter::format_status(&status)))
        }
        Command::Active => {
            let outcome = collector.active_by_validator_pubkey().await;
            print_outcome(outcome.map(|active| JsonFormatter::format_active(&active)))
        }
        Command::Serve { listen } => {
            let app = create_router(collector);
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("Failed to bind {listen}"))?;
            info!(%listen, "http api listening");
            axum::serve(listener, app).await.context("HTTP server failed")
        }
    }
}

/// Логи идут в stderr, чтобы stdout оставался чистым JSON
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Создает коллектор поверх HTTP шлюза
async fn create_collector(config: &AppConfig) -> Result<MinipoolCollector> {
    let rpc_url = config.get_rpc_url();
    let timeout = Duration::from_secs(config.get_timeout());
    // reqwest::blocking нельзя создавать внутри асинхронного контекста
    let caller = tokio::task::spawn_blocking(move || HttpCaller::new(&rpc_url, timeout))
        .await
        .context("HTTP client setup panicked")?
        .context("Failed to create HTTP client")?;

    let mut registry = ContractRegistry::new(Arc::new(caller));
    for (name, address) in config.profile.contract_addresses()? {
        registry = registry.with_contract(&name, address);
    }

    Ok(MinipoolCollector::new(registry, config.fan_out_options()))
}

fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).with_context(|| format!("Invalid minipool address: {raw}"))
}

fn print_outcome<T: Serialize, E: std::fmt::Display>(outcome: Result<T, E>) -> Result<()> {
    match outcome {
        Ok(data) => {
            println!("{}", JsonFormatter::to_json_string(&JsonFormatter::success(data))?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "collection failed");
            println!("{}", JsonFormatter::to_json_string(&JsonFormatter::failure(&e))?);
            std::process::exit(1);
        }
    }
}
