use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockfolio::app;
use stockfolio::config::{default_config_path, BackendKind, QuotesKind, ResolvedConfig};
use stockfolio::market_data::{FixtureMarketData, HttpMarketData, QuoteSource, StrategySource};
use stockfolio::portfolio::{PortfolioStore, SharedStore, ValuationService};
use stockfolio::session::{AuthSource, NewUser, SessionManager};
use stockfolio::storage::{HttpStore, JsonFileStore, PersistenceSource};
use stockfolio::sync::SyncCoordinator;

#[derive(Parser)]
#[command(name = "stockfolio")]
#[command(about = "Portfolio tracking and valuation for the stock advisor API")]
struct Cli {
    /// Path to config file.
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session
    Login { username: String, password: String },
    /// Create an account and log into it
    Register {
        username: String,
        password: String,
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Close the current session
    Logout,
    /// Show the active session
    Whoami,
    /// Portfolio management
    #[command(subcommand)]
    Portfolio(PortfolioCommand),
    /// Holding management
    #[command(subcommand)]
    Holding(HoldingCommand),
    /// Market quotes
    #[command(subcommand)]
    Quotes(QuotesCommand),
    /// Curated strategy catalog
    #[command(subcommand)]
    Strategies(StrategiesCommand),
}

#[derive(Subcommand)]
enum PortfolioCommand {
    /// List portfolios with their holdings
    List,
    /// Create a portfolio
    Create { name: String },
    /// Delete a portfolio
    Delete { id: u64 },
    /// Value portfolios at current quotes
    Value {
        /// Portfolio id; values every portfolio when omitted
        id: Option<u64>,
    },
}

#[derive(Subcommand)]
enum HoldingCommand {
    /// Add a holding, replacing any existing position for the symbol
    Add {
        portfolio_id: u64,
        symbol: String,
        #[arg(long)]
        shares: u32,
        /// Per-share purchase price
        #[arg(long)]
        price: Decimal,
        /// Purchase date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove a holding
    Remove { portfolio_id: u64, symbol: String },
}

#[derive(Subcommand)]
enum QuotesCommand {
    /// List every available quote
    List,
    /// Search quotes by symbol or company name
    Search { query: String },
    /// Daily price history for a symbol
    History {
        symbol: String,
        /// Horizon in days
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand)]
enum StrategiesCommand {
    /// List strategies
    List,
    /// Show one strategy
    Show { id: u32 },
}

struct Services {
    store: SharedStore,
    manager: SessionManager,
    coordinator: SyncCoordinator,
    quotes: Arc<dyn QuoteSource>,
    strategies: Arc<dyn StrategySource>,
}

fn build_services(config: &ResolvedConfig) -> Result<Services> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let store = PortfolioStore::shared();

    let (auth, persistence): (Arc<dyn AuthSource>, Arc<dyn PersistenceSource>) =
        match config.backend {
            BackendKind::Local => {
                let backend = Arc::new(JsonFileStore::new(&config.data_dir));
                (backend.clone(), backend)
            }
            BackendKind::Http => {
                let backend = Arc::new(
                    HttpStore::new(&config.data_dir)
                        .with_client(client.clone())
                        .with_base_url(&config.api_base_url),
                );
                (backend.clone(), backend)
            }
        };

    let (quotes, strategies): (Arc<dyn QuoteSource>, Arc<dyn StrategySource>) = match config.quotes
    {
        QuotesKind::Fixture => {
            let source = Arc::new(FixtureMarketData::new());
            (source.clone() as Arc<dyn QuoteSource>, source)
        }
        QuotesKind::Http => {
            let source = Arc::new(
                HttpMarketData::new()
                    .with_client(client)
                    .with_base_url(&config.api_base_url),
            );
            (source.clone() as Arc<dyn QuoteSource>, source)
        }
    };

    let manager = SessionManager::new(auth, persistence.clone(), store.clone());
    let coordinator = SyncCoordinator::new(store.clone(), persistence)
        .with_rollback_on_failure(config.sync.rollback_on_failure);

    Ok(Services {
        store,
        manager,
        coordinator,
        quotes,
        strategies,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    let services = build_services(&config)?;

    // Pick up a previous session before dispatching, so commands run
    // against the restored user.
    services.manager.restore().await;

    match cli.command {
        Command::Login { username, password } => {
            let doc =
                app::login(&services.manager, &username, SecretString::from(password)).await?;
            print_json(&doc)
        }
        Command::Register {
            username,
            password,
            name,
            email,
        } => {
            let doc = app::register(
                &services.manager,
                NewUser {
                    username,
                    password: SecretString::from(password),
                    name,
                    email,
                },
            )
            .await?;
            print_json(&doc)
        }
        Command::Logout => print_json(&app::logout(&services.manager).await),
        Command::Whoami => print_json(&app::whoami(&services.store).await),
        Command::Portfolio(command) => match command {
            PortfolioCommand::List => print_json(&app::list_portfolios(&services.store).await?),
            PortfolioCommand::Create { name } => {
                print_json(&app::create_portfolio(&services.coordinator, &name).await?)
            }
            PortfolioCommand::Delete { id } => {
                print_json(&app::delete_portfolio(&services.coordinator, id).await?)
            }
            PortfolioCommand::Value { id } => {
                let valuation = ValuationService::new(services.quotes.clone());
                match id {
                    Some(id) => {
                        print_json(&app::portfolio_value(&services.store, &valuation, id).await?)
                    }
                    None => print_json(&app::value_report(&services.store, &valuation).await?),
                }
            }
        },
        Command::Holding(command) => match command {
            HoldingCommand::Add {
                portfolio_id,
                symbol,
                shares,
                price,
                date,
            } => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                print_json(
                    &app::add_holding(
                        &services.coordinator,
                        portfolio_id,
                        &symbol,
                        shares,
                        price,
                        date,
                    )
                    .await?,
                )
            }
            HoldingCommand::Remove {
                portfolio_id,
                symbol,
            } => print_json(
                &app::remove_holding(&services.coordinator, portfolio_id, &symbol).await?,
            ),
        },
        Command::Quotes(command) => match command {
            QuotesCommand::List => print_json(&app::list_quotes(services.quotes.as_ref()).await?),
            QuotesCommand::Search { query } => {
                print_json(&app::search_quotes(services.quotes.as_ref(), &query).await?)
            }
            QuotesCommand::History { symbol, days } => {
                print_json(&app::price_history(services.quotes.as_ref(), &symbol, days).await?)
            }
        },
        Command::Strategies(command) => match command {
            StrategiesCommand::List => {
                print_json(&app::list_strategies(services.strategies.as_ref()).await?)
            }
            StrategiesCommand::Show { id } => {
                print_json(&app::show_strategy(services.strategies.as_ref(), id).await?)
            }
        },
    }
}
