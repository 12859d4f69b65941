//! Random activity simulation command.

use crate::display;
use anyhow::{ensure, Context, Result};
use clap::Args;
use colored::Colorize;
use ecochain_chain::{Ledger, LedgerError};
use ecochain_core::{TransactionKind, SYSTEM_ADDRESS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

const EARN_LABELS: &[&str] = &["Tree planting", "Bike commute", "Recycling", "Beach cleanup"];
const SPEND_LABELS: &[&str] = &["Coffee voucher", "Transit pass", "Seed kit"];

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of mining rounds
    #[arg(long, default_value = "5")]
    rounds: usize,

    /// Number of simulated users
    #[arg(long, default_value = "4")]
    users: usize,

    /// Transactions submitted per round
    #[arg(long, default_value = "3")]
    txs_per_round: usize,

    /// Seed for reproducible activity
    #[arg(long)]
    seed: Option<u64>,

    /// Print the ledger summary as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(ledger: &Ledger, args: SimulateArgs, shutdown: CancellationToken) -> Result<()> {
    ensure!(args.users > 0, "at least one user is required");

    let users: Vec<String> = (1..=args.users).map(|i| format!("user{}", i)).collect();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for round in 1..=args.rounds {
        for _ in 0..args.txs_per_round {
            submit_random(ledger, &users, &mut rng)?;
        }

        let miner = &users[rng.gen_range(0..users.len())];
        match ledger.spawn_mining_with_shutdown(miner.as_str(), &shutdown).wait().await {
            Ok(block) => {
                if !args.json {
                    print!("{} ", format!("round {}", round).bright_black());
                    display::print_block(&block);
                }
            }
            Err(LedgerError::MiningCancelled { .. }) => {
                eprintln!("{}", "Mining interrupted".yellow());
                break;
            }
            Err(e) => return Err(e).context("Failed to mine block"),
        }
    }

    let info = ledger.info();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    display::print_balances(ledger, &users);
    println!();
    display::print_info(&info);
    Ok(())
}

fn submit_random(ledger: &Ledger, users: &[String], rng: &mut StdRng) -> Result<()> {
    let user = &users[rng.gen_range(0..users.len())];
    let balance = ledger.balance(user);

    // Users without points can only earn.
    let choice = if balance > 0 { rng.gen_range(0..3) } else { 0 };
    match choice {
        0 => {
            let label = EARN_LABELS[rng.gen_range(0..EARN_LABELS.len())];
            ledger.create_transaction(
                SYSTEM_ADDRESS,
                user.as_str(),
                rng.gen_range(5..=50),
                TransactionKind::Earn,
                label,
            )?;
        }
        1 => {
            let label = SPEND_LABELS[rng.gen_range(0..SPEND_LABELS.len())];
            ledger.create_transaction(
                user.as_str(),
                SYSTEM_ADDRESS,
                rng.gen_range(1..=balance),
                TransactionKind::Spend,
                label,
            )?;
        }
        _ => {
            let to = &users[rng.gen_range(0..users.len())];
            ledger.create_transaction(
                user.as_str(),
                to.as_str(),
                rng.gen_range(1..=balance),
                TransactionKind::Transfer,
                "Gift",
            )?;
        }
    }
    Ok(())
}
