//! CLI commands module.

use anyhow::{Context, Result};
use clap::Subcommand;
use ecochain_chain::{Ledger, LedgerConfig};
use tokio_util::sync::CancellationToken;

mod bench;
mod demo;
mod simulate;
mod tamper;

#[derive(Subcommand)]
pub enum Commands {
    /// Walk through earning, mining and validating
    Demo,
    /// Simulate users earning and spending over several rounds
    Simulate(simulate::SimulateArgs),
    /// Mine empty blocks and report proof-of-work statistics
    Bench(bench::BenchArgs),
    /// Corrupt a mined chain and watch validation fail
    Tamper,
}

pub async fn run(cmd: Commands, config: LedgerConfig) -> Result<()> {
    let ledger = Ledger::new(config).context("Invalid ledger configuration")?;

    match cmd {
        Commands::Demo => demo::run(&ledger),
        Commands::Simulate(args) => simulate::run(&ledger, args, shutdown_on_ctrl_c()).await,
        Commands::Bench(args) => bench::run(&ledger, args, shutdown_on_ctrl_c()).await,
        Commands::Tamper => tamper::run(&ledger),
    }
}

/// Token cancelled on Ctrl-C, so a long mining run stops cleanly.
fn shutdown_on_ctrl_c() -> CancellationToken {
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            token.cancel();
        }
    });
    shutdown
}
