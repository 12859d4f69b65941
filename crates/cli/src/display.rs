//! Terminal rendering shared by the commands.

use chrono::{TimeZone, Utc};
use colored::Colorize;
use ecochain_chain::{Ledger, LedgerInfo};
use ecochain_core::{Block, Hash, Transaction, TransactionKind};

/// First 16 hex digits of a hash.
pub fn short(hash: &Hash) -> String {
    hash.to_hex()[..16].to_string()
}

/// Render a millisecond timestamp as UTC.
pub fn timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| format!("{} ms", ms))
}

pub fn validity(valid: bool) -> colored::ColoredString {
    if valid {
        "valid".green().bold()
    } else {
        "INVALID".red().bold()
    }
}

pub fn print_block(block: &Block) {
    println!(
        "  {} {} {} {}",
        format!("#{}", block.index()).bright_black(),
        short(&block.hash).bright_yellow(),
        format!("nonce={}", block.header.nonce).bright_black(),
        format!("({} txs)", block.tx_count()).bright_black()
    );
}

pub fn print_transaction(tx: &Transaction) {
    let kind = match tx.kind {
        TransactionKind::Earn => tx.kind.to_string().green(),
        TransactionKind::Spend => tx.kind.to_string().red(),
        TransactionKind::Transfer => tx.kind.to_string().cyan(),
    };
    println!(
        "    {:<8} {:>6}  {} -> {}  {}",
        kind,
        tx.amount,
        tx.from,
        tx.to,
        tx.label.bright_black()
    );
}

pub fn print_balances(ledger: &Ledger, users: &[String]) {
    println!("{}", "Balances:".bold());
    for user in users {
        let balance = ledger.balance(user);
        let rendered = if balance < 0 {
            balance.to_string().red()
        } else {
            balance.to_string().bright_white()
        };
        println!("  {:<12} {}", user, rendered);
    }
}

pub fn print_info(info: &LedgerInfo) {
    println!("{}", "Ledger:".bold().cyan());
    println!("  Blocks:        {}", info.total_blocks);
    println!("  Transactions:  {}", info.total_transactions);
    println!("  Pending:       {}", info.pending_transactions);
    println!("  Chain:         {}", validity(info.is_valid));
    println!("  Difficulty:    {}", info.difficulty);
    println!("  Reward:        {}", info.mining_reward);
    println!("  Total supply:  {}", info.total_supply);
    println!(
        "  Latest block:  #{} {}",
        info.latest_block_index,
        short(&info.latest_block_hash).bright_yellow()
    );

    let window = &info.window;
    match window.average_nonce {
        Some(nonce) => println!("  Avg nonce:     {:.1} (last {} blocks)", nonce, window.blocks),
        None => println!("  Avg nonce:     -"),
    }
    match window.average_block_time_ms {
        Some(ms) => println!("  Avg interval:  {:.1} ms", ms),
        None => println!("  Avg interval:  -"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short(&Hash::ZERO), "0000000000000000");
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(timestamp(1_500), "1970-01-01 00:00:01.500 UTC");
    }
}
