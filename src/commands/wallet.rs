// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::ledger::LedgerStore;
use crate::models::Wallet;
use crate::price::{refresh, refresh_if_stale, CoindeskSource, RefreshOutcome};
use crate::utils::{fmt_btc, fmt_usd, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{Local, Utc};
use rusqlite::Connection;
use serde::Serialize;

#[derive(Serialize)]
struct BalanceView<'a> {
    #[serde(flatten)]
    wallet: &'a Wallet,
    usd_value: Option<String>,
    refreshed: Option<bool>,
}

pub fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let store = LedgerStore::new(conn);
    let outcome = if sub.get_flag("offline") {
        None
    } else {
        let source = CoindeskSource::from_settings(&settings);
        refresh_if_stale(&store, &source, Utc::now(), settings.refresh_after_hours)?
    };
    let wallet = store.get_wallet()?;

    let view = BalanceView {
        wallet: &wallet,
        usd_value: wallet.usd_value().map(|v| v.round_dp(2).to_string()),
        refreshed: outcome
            .as_ref()
            .map(|o| matches!(o, RefreshOutcome::Updated(_))),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &view)? {
        return Ok(());
    }
    println!("{}", wallet_table(&wallet, outcome.as_ref()));
    Ok(())
}

pub fn handle_rate(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = LedgerStore::new(conn);
    match m.subcommand() {
        Some(("show", _)) => {
            let wallet = store.get_wallet()?;
            println!("{}", rate_label(&wallet, None));
        }
        Some(("refresh", sub)) => {
            let settings = Settings::load(conn)?;
            let source = CoindeskSource::from_settings(&settings);
            let outcome = if sub.get_flag("force") {
                Some(refresh(&store, &source)?)
            } else {
                refresh_if_stale(&store, &source, Utc::now(), settings.refresh_after_hours)?
            };
            match &outcome {
                None => println!("Rate is fresh; use --force to fetch anyway."),
                Some(RefreshOutcome::Failed(e)) => eprintln!("Rate refresh failed: {}", e),
                Some(RefreshOutcome::Updated(_)) => {}
            }
            let wallet = store.get_wallet()?;
            println!("{}", rate_label(&wallet, outcome.as_ref()));
        }
        _ => {}
    }
    Ok(())
}

/// `BTCUSD <rate>`, or `Failure` right after a failed refresh.
pub fn rate_label(wallet: &Wallet, outcome: Option<&RefreshOutcome>) -> String {
    if let Some(RefreshOutcome::Failed(_)) = outcome {
        return "Failure".to_string();
    }
    if wallet.rate.is_zero() {
        "BTCUSD unknown".to_string()
    } else {
        format!("BTCUSD {}", wallet.rate.round_dp(4))
    }
}

fn wallet_table(wallet: &Wallet, outcome: Option<&RefreshOutcome>) -> comfy_table::Table {
    let last_update = wallet
        .last_update
        .map(|t| t.with_timezone(&Local).format("%b %d, %Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let usd = wallet
        .usd_value()
        .map(|v| fmt_usd(&v))
        .unwrap_or_else(|| "-".to_string());
    pretty_table(
        &["Balance (BTC)", "Rate", "Value", "Rate updated"],
        vec![vec![
            fmt_btc(&wallet.balance),
            rate_label(wallet, outcome),
            usd,
            last_update,
        ]],
    )
}
