//! Smart-money copy-trading CLI.
//!
//! Ranks wallets from the exchange leaderboard, watches the live trade
//! stream, and replicates qualifying trades under strict risk bounds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use smartcopy::api::{DataClient, RestExecutionClient};
use smartcopy::models::{FillMode, TradeSide};
use smartcopy::trading::{CohortConfig, CopyConfig, CopyEngine, TradeFilter};

/// Smart-money copy-trading CLI.
#[derive(Parser)]
#[command(name = "smartcopy")]
#[command(about = "Copy trades from smart-money prediction-market wallets", long_about = None)]
struct Cli {
    /// Data API base URL
    #[arg(
        long,
        env = "SMARTCOPY_DATA_URL",
        default_value = "https://data-api.polymarket.com"
    )]
    data_url: String,

    /// Trading backend base URL
    #[arg(long, env = "SMARTCOPY_ORDER_URL", default_value = "http://127.0.0.1:8080")]
    order_url: String,

    /// Fill-feed polling interval in seconds
    #[arg(long, default_value = "5")]
    poll_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the current smart-money cohort
    Cohort {
        /// Maximum number of wallets to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Minimum P&L in USD for cohort admission
        #[arg(short, long, default_value = "500")]
        min_pnl: f64,
    },

    /// Watch the live trade stream
    Watch {
        /// Only show trades from these addresses (repeatable)
        #[arg(short, long)]
        address: Vec<String>,

        /// Minimum trade size in outcome tokens
        #[arg(long)]
        min_size: Option<f64>,

        /// Only show trades from cohort members
        #[arg(long)]
        smart_only: bool,
    },

    /// Start auto-copying trades
    Copy {
        /// Wallet addresses to copy (repeatable)
        #[arg(short, long)]
        address: Vec<String>,

        /// Also copy the top-N cohort wallets
        #[arg(short, long, default_value = "5")]
        top: usize,

        /// Fraction of the source trade size to replicate
        #[arg(long, default_value = "0.1")]
        scale: f64,

        /// Maximum notional per replicated trade in USD
        #[arg(long, default_value = "100")]
        max_per_trade: f64,

        /// Maximum slippage fraction versus the observed price
        #[arg(long, default_value = "0.03")]
        slippage: f64,

        /// Delay between detection and replication in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Minimum source-trade notional to react to in USD
        #[arg(long, default_value = "10")]
        min_source: f64,

        /// Only copy this side (buy or sell)
        #[arg(long)]
        side: Option<String>,

        /// Accept partial fills instead of all-or-nothing
        #[arg(long)]
        partial: bool,

        /// Execute real orders (default is dry run)
        #[arg(long)]
        live: bool,
    },

    /// Show the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Live collaborators; the data client serves both the leaderboard
    // and the polled fill feed
    let data = Arc::new(
        DataClient::with_base_url(cli.data_url.clone())?
            .with_poll_interval(Duration::from_secs(cli.poll_interval)),
    );
    let backend = Arc::new(RestExecutionClient::new(cli.order_url.clone())?);

    match cli.command {
        Commands::Cohort { limit, min_pnl } => {
            let engine = CopyEngine::new(
                data.clone(),
                data,
                backend,
                CohortConfig {
                    min_pnl,
                    ..Default::default()
                },
            );

            info!(limit = limit, min_pnl = min_pnl, "Selecting cohort");
            let cohort = engine.select_cohort(limit).await?;

            println!(
                "\n{:<44} {:<20} {:>12} {:>14} {:>6}",
                "ADDRESS", "NAME", "PNL", "VOLUME", "SCORE"
            );
            println!("{}", "-".repeat(100));

            for wallet in cohort {
                println!(
                    "{:<44} {:<20} {:>12.2} {:>14.2} {:>6}",
                    wallet.address,
                    truncate(&wallet.display_name(), 18),
                    wallet.pnl,
                    wallet.volume,
                    wallet.score
                );
            }
        }

        Commands::Watch {
            address,
            min_size,
            smart_only,
        } => {
            let engine = CopyEngine::new(data.clone(), data, backend, CohortConfig::default());

            // The filter never refreshes the cohort cache itself
            if smart_only {
                engine.select_cohort(50).await?;
            }

            let mut filter = TradeFilter::for_addresses(&address);
            if let Some(min) = min_size {
                filter = filter.with_min_size(Decimal::try_from(min)?);
            }
            if smart_only {
                filter = filter.smart_money_only();
            }

            let subscription = engine
                .subscribe_trades(filter, |trade| {
                    let tag = if trade.smart_money { "*" } else { " " };
                    println!(
                        "[{}]{} {} {} {} @ {} (${:.2}) {}",
                        trade.timestamp.format("%H:%M:%S"),
                        tag,
                        short_address(&trade.trader_address),
                        trade.side.as_str(),
                        trade.size,
                        trade.price,
                        trade.notional(),
                        trade.outcome
                    );
                })
                .await;

            println!("\nWatching live trades. Press Ctrl+C to stop.\n");
            tokio::signal::ctrl_c().await?;
            subscription.unsubscribe().await;
        }

        Commands::Copy {
            address,
            top,
            scale,
            max_per_trade,
            slippage,
            delay_ms,
            min_source,
            side,
            partial,
            live,
        } => {
            let engine = CopyEngine::new(data.clone(), data, backend, CohortConfig::default());

            let side_filter = side
                .as_deref()
                .map(|s| {
                    TradeSide::from_api_str(s)
                        .ok_or_else(|| anyhow::anyhow!("Unknown side: {}", s))
                })
                .transpose()?;

            let config = CopyConfig {
                addresses: address,
                top_traders: top,
                size_scale: Decimal::try_from(scale)?,
                max_size_per_trade: Decimal::try_from(max_per_trade)?,
                max_slippage: Decimal::try_from(slippage)?,
                fill_mode: if partial {
                    FillMode::Partial
                } else {
                    FillMode::FillOrKill
                },
                copy_delay_ms: delay_ms,
                min_trade_size: Decimal::try_from(min_source)?,
                side_filter,
                dry_run: !live,
                ..Default::default()
            };

            info!(top = top, live = live, "Starting auto-copy");
            let session = engine.start_auto_copy(config).await?;

            println!("\n=== Smart-Money Copy Trading ===");
            println!("Session:  {}", session.id());
            println!("Targets:  {}", session.target_addresses().len());
            println!(
                "Mode:     {}",
                if live {
                    "LIVE TRADING"
                } else {
                    "DRY RUN (no real orders)"
                }
            );
            println!("\nPress Ctrl+C to stop.\n");

            tokio::signal::ctrl_c().await?;
            println!("\nStopping session...");
            session.stop().await;

            println!("\n{}", session.stats().await);
        }

        Commands::Config => {
            let config = CopyConfig::default();
            let cohort = CohortConfig::default();

            println!("\n=== Copy Configuration ===\n");
            println!("Sizing:");
            println!("  Size Scale:        {}", config.size_scale);
            println!("  Max Per Trade:     ${}", config.max_size_per_trade);
            println!("  Min Source Trade:  ${}", config.min_trade_size);
            println!("  Min Order Size:    ${}", config.min_order_size);

            println!("\nExecution:");
            println!(
                "  Max Slippage:      {}%",
                config.max_slippage * Decimal::from(100)
            );
            println!("  Fill Mode:         {}", config.fill_mode.as_str());
            println!("  Copy Delay:        {}ms", config.copy_delay_ms);
            println!("  Dry Run:           {}", config.dry_run);

            println!("\nCohort:");
            println!("  Min P&L:           ${}", cohort.min_pnl);
            println!("  Cache TTL:         {}s", cohort.ttl.as_secs());
            println!("  Top Traders:       {}", config.top_traders);
        }
    }

    Ok(())
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

/// Shorten a wallet address for display.
fn short_address(address: &str) -> String {
    if address.len() > 10 {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}
