// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction and wallet records. The wallet balance always equals the sum
//! of every stored transaction amount; both are written in one SQLite
//! transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::models::{ExpenseCategory, NewTransaction, Transaction, TransactionType, Wallet};
use crate::utils::{from_db_decimal, from_db_timestamp, to_db_timestamp, truncate_micros};

pub struct LedgerStore<'c> {
    conn: &'c Connection,
}

impl<'c> LedgerStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    pub fn add_transaction(&self, new: NewTransaction) -> Result<Transaction, PersistenceError> {
        self.add_transaction_at(new, Utc::now())
    }

    /// Inserts the record and moves the balance by its amount.
    pub fn add_transaction_at(
        &self,
        new: NewTransaction,
        date: DateTime<Utc>,
    ) -> Result<Transaction, PersistenceError> {
        let date = truncate_micros(date);
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO transactions(date, amount, type, category) VALUES (?1, ?2, ?3, ?4)",
            params![
                to_db_timestamp(&date),
                new.amount().to_string(),
                new.kind().as_str(),
                new.category().map(|c| c.as_str()),
            ],
        )?;
        let id = tx.last_insert_rowid();

        let wallet = load_or_create_wallet(&tx)?;
        let balance = wallet.balance.checked_add(new.amount()).ok_or(
            PersistenceError::BalanceOverflow {
                balance: wallet.balance,
                amount: new.amount(),
            },
        )?;
        tx.execute(
            "UPDATE wallet SET balance=?1 WHERE id=1",
            params![balance.to_string()],
        )?;
        self.save(tx)?;

        info!(id, amount = %new.amount(), kind = %new.kind(), %balance, "recorded transaction");
        Ok(Transaction {
            id,
            amount: new.amount(),
            r#type: new.kind(),
            category: new.category(),
            date,
        })
    }

    /// The singleton wallet, created with a zero balance on first access.
    pub fn get_wallet(&self) -> Result<Wallet, PersistenceError> {
        load_or_create_wallet(self.conn)
    }

    /// Overwrites the cached rate. `(0, None)` records "unknown".
    pub fn update_rate(
        &self,
        rate: Decimal,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), PersistenceError> {
        let tx = self.conn.unchecked_transaction()?;
        load_or_create_wallet(&tx)?;
        tx.execute(
            "UPDATE wallet SET rate=?1, last_update=?2 WHERE id=1",
            params![rate.to_string(), updated_at.as_ref().map(to_db_timestamp)],
        )?;
        self.save(tx)?;
        debug!(%rate, ?updated_at, "wallet rate updated");
        Ok(())
    }

    /// Commits pending changes. Nothing is retried or rolled back on failure.
    pub fn save(&self, tx: rusqlite::Transaction<'_>) -> Result<(), PersistenceError> {
        tx.commit().map_err(PersistenceError::from)
    }

    pub fn transaction_count(&self) -> Result<usize, PersistenceError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    pub fn sum_amounts(&self) -> Result<Decimal, PersistenceError> {
        let mut stmt = self.conn.prepare("SELECT amount FROM transactions")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut total = Decimal::ZERO;
        for row in rows {
            let amount = from_db_decimal("amount", &row?)?;
            total = total
                .checked_add(amount)
                .ok_or(PersistenceError::BalanceOverflow {
                    balance: total,
                    amount,
                })?;
        }
        Ok(total)
    }

    /// Oldest first; used by exports.
    pub fn all_transactions(&self) -> Result<Vec<Transaction>, PersistenceError> {
        query_transactions(
            self.conn,
            "SELECT id, date, amount, type, category FROM transactions ORDER BY date, id",
            [],
        )
    }
}

fn load_or_create_wallet(conn: &Connection) -> Result<Wallet, PersistenceError> {
    let created = conn.execute(
        "INSERT OR IGNORE INTO wallet(id, balance, rate, last_update) VALUES (1, '0', '0', NULL)",
        [],
    )?;
    if created > 0 {
        info!("created wallet");
    }
    let (balance, rate, last_update) = conn.query_row(
        "SELECT balance, rate, last_update FROM wallet WHERE id=1",
        [],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        },
    )?;
    Ok(Wallet {
        balance: from_db_decimal("balance", &balance)?,
        rate: from_db_decimal("rate", &rate)?,
        last_update: last_update
            .map(|s| from_db_timestamp("last_update", &s))
            .transpose()?,
    })
}

/// Runs a query whose columns are `id, date, amount, type, category`.
pub(crate) fn query_transactions<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Transaction>, PersistenceError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut data = Vec::new();
    for row in rows {
        let (id, date, amount, kind, category) = row?;
        let kind = kind
            .parse::<TransactionType>()
            .map_err(|value| PersistenceError::Corrupt { field: "type", value })?;
        let category = match category {
            Some(c) => Some(c.parse::<ExpenseCategory>().map_err(|_| {
                PersistenceError::Corrupt {
                    field: "category",
                    value: c.clone(),
                }
            })?),
            None => None,
        };
        data.push(Transaction {
            id,
            amount: from_db_decimal("amount", &amount)?,
            r#type: kind,
            category,
            date: from_db_timestamp("date", &date)?,
        });
    }
    Ok(data)
}
