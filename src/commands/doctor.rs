// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::LedgerStore;
use crate::models::TransactionType;
use crate::utils::{fmt_btc, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Returns `(issue, detail)` pairs; empty when the ledger is consistent.
pub fn check(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();
    let store = LedgerStore::new(conn);

    // 1) Balance must equal the sum of all amounts
    let wallet = store.get_wallet()?;
    let sum = store.sum_amounts()?;
    if wallet.balance != sum {
        issues.push((
            "balance_mismatch".into(),
            format!("wallet {} BTC, ledger {} BTC", fmt_btc(&wallet.balance), fmt_btc(&sum)),
        ));
    }

    // 2) Category present exactly for expenses
    let mut stmt = conn.prepare(
        "SELECT id, type FROM transactions
         WHERE (type = 'expense') != (category IS NOT NULL)",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        issues.push(("category_mismatch".into(), format!("#{} {}", id, kind)));
    }

    // 3) Sign agrees with type, amount not zero
    for t in store.all_transactions()? {
        let ok = match t.r#type {
            TransactionType::Income => t.amount.is_sign_positive(),
            TransactionType::Expense => t.amount.is_sign_negative(),
        };
        if t.amount.is_zero() || !ok {
            issues.push((
                "amount_sign".into(),
                format!("#{} {} {}", t.id, t.r#type, t.amount),
            ));
        }
    }

    // 4) Rate and last update are set together
    if wallet.rate.is_zero() != wallet.last_update.is_none() {
        issues.push((
            "rate_state".into(),
            format!("rate {} with last_update {:?}", wallet.rate, wallet.last_update),
        ));
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = check(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues.into_iter().map(|(a, b)| vec![a, b]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
