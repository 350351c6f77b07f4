//! Searcher entry point: configuration, logging and the block loop.

use clap::{Parser, Subcommand};
use crossmarket::bootstrap::bootstrap_registry;
use crossmarket::bot::{Bot, BLOCK_CHANNEL_SIZE};
use crossmarket::config::Config;
use crossmarket::sync::subscribe_to_blocks;
use crossmarket::utils::app_context::AppContext;
use crossmarket::utils::logger::setup_logger;
use eyre::{Error, Result};
use log::info;
use tokio::sync::mpsc;

/// Command line interface
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand, `start` when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the markets and run the bot (default)
    Start,
    /// Discover and refresh the markets once, print a summary and exit
    Discover,
}

/// Bootstraps the registry and runs the bot until the block stream ends
async fn start(ctx: AppContext) -> Result<(), Error> {
    let settings = ctx.market_settings();
    let registry = bootstrap_registry(&ctx.chain, &settings).await?;
    info!("all markets length: {}", registry.pools().len());

    let relay = ctx.relay()?;
    let pipeline = ctx.pipeline();
    let health_check = ctx.health_check()?;
    let miner_reward_percentage = ctx.config.miner_reward_percentage;

    let (tx, rx) = mpsc::channel(BLOCK_CHANNEL_SIZE);
    let ws_url = ctx.config.ws_url.clone();
    tokio::spawn(async move {
        info!("Starting block subscription task");
        subscribe_to_blocks(ws_url, tx).await;
    });

    let mut bot = Bot::new(
        ctx.chain,
        relay,
        registry,
        settings,
        pipeline,
        miner_reward_percentage,
        health_check,
    );
    bot.run(rx).await;
    Ok(())
}

/// Bootstraps the registry once and prints a summary
async fn discover_only(ctx: AppContext) -> Result<(), Error> {
    let settings = ctx.market_settings();
    let registry = bootstrap_registry(&ctx.chain, &settings).await?;
    let markets = registry.markets_by_token();
    println!(
        "\nFound {} pools, {} liquid pools across {} tokens",
        registry.pools().len(),
        markets.pool_count(),
        markets.len()
    );
    for (token, pools) in markets.iter().filter(|(_, pools)| pools.len() > 1) {
        println!("  {token}: {} pools", pools.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_logger()?;

    let cli = Cli::parse();
    let ctx = AppContext::new(Config::from_env()?)?;

    match cli.command {
        Some(Commands::Discover) => discover_only(ctx).await?,
        Some(Commands::Start) | None => start(ctx).await?,
    }

    Ok(())
}
