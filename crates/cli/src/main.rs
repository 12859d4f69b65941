//! ecochain CLI entry point.

use clap::Parser;
use ecochain_chain::LedgerConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "ecochain")]
#[command(about = "A proof-of-work ledger for eco-points", long_about = None)]
struct Cli {
    /// Required leading zero hex digits per block
    #[arg(short, long, global = true, default_value = "2")]
    difficulty: usize,

    /// Points minted to the miner of each block
    #[arg(short, long, global = true, default_value = "10")]
    reward: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = LedgerConfig::new(cli.difficulty, cli.reward);

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, config).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("ecochain - A proof-of-work ledger for eco-points");
            println!("Run 'ecochain --help' for usage information.");
        }
    }
}
