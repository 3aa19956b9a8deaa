// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TransactionType;

/// Rejected user input. Raised before anything reaches the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid amount '{0}', expected a BTC decimal such as 0.0015")]
    InvalidAmount(String),

    #[error("Amount must not be zero")]
    ZeroAmount,

    #[error("Amount {0} is out of range (at most 21,000,000 BTC with 8 decimal places)")]
    AmountOutOfRange(Decimal),

    #[error("Expense transactions require a category")]
    MissingCategory,

    #[error("Income transactions cannot carry a category")]
    UnexpectedCategory,

    #[error("Amount {amount} does not match a {kind} transaction")]
    SignMismatch {
        amount: Decimal,
        kind: TransactionType,
    },

    #[error("Unknown category '{0}' (use groceries|taxi|electronics|restaurant|other)")]
    UnknownCategory(String),
}

/// Storage failure while reading or committing ledger state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored {field} value '{value}' is not readable")]
    Corrupt { field: &'static str, value: String },

    #[error("Balance {balance} cannot absorb {amount}")]
    BalanceOverflow { balance: Decimal, amount: Decimal },
}

/// Every way the price request can fail. All of them collapse to
/// "refresh failed" for the wallet.
#[derive(Debug, Error)]
pub enum NetworkRequestError {
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Bad status code {0}")]
    BadStatusCode(u16),

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting '{0}' (use price_endpoint|page_size|refresh_after_hours|http_timeout_secs)")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(e: rusqlite::Error) -> Self {
        ConfigError::Persistence(PersistenceError::Sqlite(e))
    }
}
