//! Guided walk-through command.

use crate::display;
use anyhow::{Context, Result};
use colored::Colorize;
use ecochain_chain::Ledger;
use ecochain_core::{TransactionKind, SYSTEM_ADDRESS};

pub fn run(ledger: &Ledger) -> Result<()> {
    println!("{}", "ecochain demo".bold().cyan());
    println!();

    ledger.create_transaction(SYSTEM_ADDRESS, "alice", 50, TransactionKind::Earn, "Tree planting")?;
    ledger.create_transaction(SYSTEM_ADDRESS, "bob", 20, TransactionKind::Earn, "Bike commute")?;
    println!("{}  Queued 2 earn transactions", "✓".green().bold());

    let block = ledger.mine_block("alice").context("Failed to mine block")?;
    println!("{}  Mined block (reward to alice)", "✓".green().bold());
    display::print_block(&block);
    println!("    at {}", display::timestamp(block.header.timestamp));

    let transfer =
        ledger.create_transaction("alice", "bob", 15, TransactionKind::Transfer, "Thanks for the ride")?;
    ledger.create_transaction("bob", SYSTEM_ADDRESS, 10, TransactionKind::Spend, "Coffee voucher")?;
    let block = ledger.mine_block("bob").context("Failed to mine block")?;
    println!("{}  Mined block (reward to bob)", "✓".green().bold());
    display::print_block(&block);

    if let Some((index, proof)) = ledger.inclusion_proof(&transfer.id) {
        println!(
            "    transfer included in block #{} ({} sibling hashes): {}",
            index,
            proof.siblings.len(),
            display::validity(ledger.verify_inclusion(index, &proof))
        );
    }

    println!();
    println!("{}", "History of alice:".bold());
    for tx in ledger.history("alice") {
        display::print_transaction(&tx);
    }

    println!();
    display::print_balances(ledger, &["alice".to_string(), "bob".to_string()]);
    println!();
    display::print_info(&ledger.info());
    Ok(())
}
