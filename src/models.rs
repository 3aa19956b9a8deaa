// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(other.to_string()),
        }
    }
}

/// Spending category. Only expenses carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Groceries,
    Taxi,
    Electronics,
    Restaurant,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Groceries,
        ExpenseCategory::Taxi,
        ExpenseCategory::Electronics,
        ExpenseCategory::Restaurant,
        ExpenseCategory::Other,
    ];

    /// Stable identifier used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Groceries => "groceries",
            ExpenseCategory::Taxi => "taxi",
            ExpenseCategory::Electronics => "electronics",
            ExpenseCategory::Restaurant => "restaurant",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        ExpenseCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub category: Option<ExpenseCategory>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    /// BTC/USD; zero means unknown.
    pub rate: Decimal,
    pub last_update: Option<DateTime<Utc>>,
}

impl Wallet {
    /// `None` when the rate is unknown or the product does not fit.
    pub fn usd_value(&self) -> Option<Decimal> {
        if self.rate.is_zero() {
            None
        } else {
            self.balance.checked_mul(self.rate)
        }
    }
}

/// Total BTC supply; no single transaction may exceed it.
pub const MAX_BTC_AMOUNT: Decimal = Decimal::from_parts(21_000_000, 0, 0, false, 0);

/// Satoshi precision.
pub const BTC_DECIMAL_PLACES: u32 = 8;

/// A transaction that passed validation and may be handed to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTransaction {
    amount: Decimal,
    kind: TransactionType,
    category: Option<ExpenseCategory>,
}

impl NewTransaction {
    pub fn new(
        amount: Decimal,
        kind: TransactionType,
        category: Option<ExpenseCategory>,
    ) -> Result<Self, ValidationError> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount);
        }
        if amount.abs() > MAX_BTC_AMOUNT || amount.normalize().scale() > BTC_DECIMAL_PLACES {
            return Err(ValidationError::AmountOutOfRange(amount));
        }
        match (kind, category) {
            (TransactionType::Expense, None) => return Err(ValidationError::MissingCategory),
            (TransactionType::Income, Some(_)) => {
                return Err(ValidationError::UnexpectedCategory);
            }
            _ => {}
        }
        let sign_ok = match kind {
            TransactionType::Income => amount.is_sign_positive(),
            TransactionType::Expense => amount.is_sign_negative(),
        };
        if !sign_ok {
            return Err(ValidationError::SignMismatch { amount, kind });
        }
        Ok(Self {
            amount,
            kind,
            category,
        })
    }

    /// Expense from the positive amount a user types in; stored negated.
    pub fn expense(entered: Decimal, category: Option<ExpenseCategory>) -> Result<Self, ValidationError> {
        Self::new(-entered, TransactionType::Expense, category)
    }

    pub fn income(entered: Decimal) -> Result<Self, ValidationError> {
        Self::new(entered, TransactionType::Income, None)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn category(&self) -> Option<ExpenseCategory> {
        self.category
    }
}

/// Rows sharing one headline, e.g. transactions of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSection<K, R> {
    pub headline: K,
    pub rows: Vec<R>,
}

impl<K: Ord, R> GroupedSection<K, R> {
    /// Partitions `rows` by `by` and sorts each section with `sorted`.
    /// The sort is stable. Sections come back in ascending headline order.
    pub fn group<F, C>(rows: Vec<R>, by: F, mut sorted: C) -> Vec<Self>
    where
        F: Fn(&R) -> K,
        C: FnMut(&R, &R) -> Ordering,
    {
        let mut groups: BTreeMap<K, Vec<R>> = BTreeMap::new();
        for row in rows {
            groups.entry(by(&row)).or_default().push(row);
        }
        groups
            .into_iter()
            .map(|(headline, mut rows)| {
                rows.sort_by(&mut sorted);
                GroupedSection { headline, rows }
            })
            .collect()
    }
}
