// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::required;
use crate::config::Settings;
use crate::ledger::LedgerStore;
use crate::models::{ExpenseCategory, NewTransaction, Transaction};
use crate::reader::{DaySection, TransactionFeed};
use crate::utils::{fmt_btc, maybe_print_json, parse_btc_amount, pretty_table};
use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::Connection;

/// Expense: the entered amount is negated before it is stored.
pub fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_btc_amount(required(sub, "amount")?)?;
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.parse::<ExpenseCategory>())
        .transpose()?;
    let new = NewTransaction::expense(amount, category)?;
    record(conn, new)
}

pub fn replenish(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_btc_amount(required(sub, "amount")?)?;
    let new = NewTransaction::income(amount)?;
    record(conn, new)
}

fn record(conn: &Connection, new: NewTransaction) -> Result<()> {
    let settings = Settings::load(conn)?;
    let store = LedgerStore::new(conn);
    let mut feed = TransactionFeed::new(settings.page_size);
    feed.load_first(conn)?;
    let tx = feed
        .record(&store, new)
        .context("Failed to save transaction")?;
    let wallet = store.get_wallet()?;
    println!(
        "Recorded {} {} BTC, balance {} BTC",
        tx.r#type,
        fmt_btc(&tx.amount),
        fmt_btc(&wallet.balance)
    );
    print_sections(feed.sections());
    Ok(())
}

pub fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let page_size = sub
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(settings.page_size);
    let pages = sub.get_one::<usize>("pages").copied().unwrap_or(1);
    let all = sub.get_flag("all");

    let mut feed = TransactionFeed::new(page_size);
    let mut loaded = 0;
    let mut more = feed.load_first(conn)?;
    while more {
        loaded += 1;
        if !all && loaded >= pages {
            break;
        }
        more = feed.load_more(conn)?;
    }

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &feed.sections())? {
        return Ok(());
    }
    if feed.loaded_count() == 0 {
        println!("No transactions yet.");
        return Ok(());
    }
    print_sections(feed.sections());
    if feed.all_transactions_received() {
        println!("All transactions received.");
    } else {
        println!(
            "Showing {} transactions; use --pages {} or --all for more.",
            feed.loaded_count(),
            loaded + 1
        );
    }
    Ok(())
}

pub fn print_sections(sections: &[DaySection]) {
    for section in sections {
        println!("{}", section.headline.format("%A, %-d %B %Y"));
        let rows: Vec<Vec<String>> = section.rows.iter().map(row_cells).collect();
        println!(
            "{}",
            pretty_table(&["Time", "Type", "Category", "Amount (BTC)"], rows)
        );
    }
}

fn row_cells(t: &Transaction) -> Vec<String> {
    vec![
        t.date.with_timezone(&Local).format("%-I:%M %p").to_string(),
        t.r#type.to_string(),
        t.category.map(|c| c.to_string()).unwrap_or_default(),
        fmt_btc(&t.amount),
    ]
}
