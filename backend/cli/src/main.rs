mod check_cmd;
mod commands_cmd;
mod console;
mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use parley_config::{apply_all_defaults, config_dir, config_file_path, load_config, prepare, BotConfig};
use parley_core::GatewayBus;
use parley_logging::init_logger;

use console::ConsoleReplies;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "parley: chat command dispatch driven from the console")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.parley/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read messages from stdin and dispatch them until EOF
    Run {
        /// Extra prefix on top of the configured ones
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Validate the config file
    Check,
    /// List every command the demo modules register
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(|| config_file_path(&config_dir()));
    let raw = load_config(&path).await?;

    match cli.command {
        Commands::Run { prefix } => run(raw, prefix).await,
        Commands::Check => check_cmd::run(&path, &raw),
        Commands::Commands => commands_cmd::run(raw).await,
    }
}

async fn run(raw: BotConfig, extra_prefix: Option<String>) -> Result<()> {
    init_logging(&raw);
    let mut config = prepare(raw)?;
    if let Some(prefix) = extra_prefix {
        config.prefixes.get_or_insert_with(Vec::new).push(prefix);
    }
    info!(prefixes = ?config.prefixes(), modules = config.modules.len(), "Starting console bot");

    let bot = demo::console_bot(&config, Arc::new(ConsoleReplies::new())).await?;

    let mut bus = GatewayBus::new();
    let rx = bus.take_rx().ok_or_else(|| anyhow!("gateway receiver already taken"))?;
    let runner = tokio::spawn({
        let bot = bot.clone();
        async move { bot.run(rx).await }
    });

    let pumped = console::pump_stdin(bus.sender()).await;
    // Closing the bus lets the run loop drain and return.
    drop(bus);
    runner.await?;
    pumped
}

fn init_logging(raw: &BotConfig) {
    let config = apply_all_defaults(raw.clone());
    let logging = config.logging.clone().unwrap_or_default();
    let dir = logging
        .dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("logs"));
    init_logger(dir, config.log_level(), logging.json.unwrap_or(false));
}
