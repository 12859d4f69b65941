//! Tamper detection command.

use crate::display;
use anyhow::{Context, Result};
use colored::Colorize;
use ecochain_chain::Ledger;
use ecochain_core::{Block, Hash, TransactionKind, SYSTEM_ADDRESS};

pub fn run(ledger: &Ledger) -> Result<()> {
    println!("{}", "Building a chain...".bold().cyan());
    for (user, amount) in [("alice", 30), ("bob", 20), ("carol", 40)] {
        ledger.create_transaction(SYSTEM_ADDRESS, user, amount, TransactionKind::Earn, "Recycling")?;
        let block = ledger.mine_block(user).context("Failed to mine block")?;
        display::print_block(&block);
    }
    println!("  Chain: {}", display::validity(ledger.is_chain_valid()));
    println!();

    let blocks = ledger.blocks();
    let attacks: [(&str, fn(&mut Vec<Block>)); 3] = [
        ("Inflate a sealed amount", |blocks| {
            blocks[1].transactions[0].amount *= 10;
        }),
        ("Rewrite a parent link", |blocks| {
            blocks[2].header.prev_hash = Hash::ZERO;
        }),
        ("Bump a nonce", |blocks| {
            blocks[3].header.nonce = blocks[3].header.nonce.wrapping_add(1);
        }),
    ];

    for (name, attack) in attacks {
        let mut copy = (*blocks).clone();
        attack(&mut copy);
        let tampered = Ledger::from_chain(ledger.config().clone(), copy)?;

        println!("{}", name.bold());
        match tampered.validate_chain() {
            Ok(()) => println!("  Chain: {}", display::validity(true)),
            Err(e) => println!("  Chain: {} ({})", display::validity(false), e),
        }
    }

    println!();
    println!(
        "Original chain still {}",
        display::validity(ledger.is_chain_valid())
    );
    Ok(())
}
