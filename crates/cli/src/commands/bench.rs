//! Mining benchmark command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ecochain_chain::{Ledger, LedgerError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct BenchArgs {
    /// Number of empty blocks to mine
    #[arg(short, long, default_value = "10")]
    blocks: usize,
}

pub async fn run(ledger: &Ledger, args: BenchArgs, shutdown: CancellationToken) -> Result<()> {
    println!(
        "{} {} blocks at difficulty {}",
        "Benchmarking".bold().cyan(),
        args.blocks,
        ledger.config().difficulty
    );

    let mut nonces = Vec::with_capacity(args.blocks);
    let mut times = Vec::with_capacity(args.blocks);

    for _ in 0..args.blocks {
        let started = Instant::now();
        match ledger.spawn_mining_with_shutdown("bench", &shutdown).wait().await {
            Ok(block) => {
                nonces.push(block.header.nonce);
                times.push(started.elapsed());
            }
            Err(LedgerError::MiningCancelled { .. }) => {
                eprintln!("{}", "Benchmark interrupted".yellow());
                break;
            }
            Err(e) => return Err(e).context("Failed to mine block"),
        }
    }

    if nonces.is_empty() {
        return Ok(());
    }

    let total: Duration = times.iter().sum();
    let mined = nonces.len() as u32;
    let attempts: u64 = nonces.iter().map(|n| n + 1).sum();
    let rate = attempts as f64 / total.as_secs_f64().max(f64::EPSILON);

    println!();
    println!("  Blocks mined:   {}", mined);
    println!("  Mean nonce:     {:.1}", attempts as f64 / mined as f64 - 1.0);
    println!("  Max nonce:      {}", nonces.iter().max().copied().unwrap_or_default());
    println!("  Mean time:      {:?}", total / mined);
    println!("  Hash rate:      {:.0} H/s", rate);
    println!("  Chain:          {}", crate::display::validity(ledger.is_chain_valid()));
    Ok(())
}
