// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::error::{PersistenceError, ValidationError};

const UA: &str = concat!(
    "btcledger/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/btcledger)"
);

pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(UA)
        .build()
}

/// Parses a user-entered BTC amount. A comma is read as the decimal separator.
pub fn parse_btc_amount(s: &str) -> Result<Decimal, ValidationError> {
    let normalized = s.trim().replace(',', ".");
    normalized
        .parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidAmount(s.to_string()))
}

/// Up to eight fraction digits, no trailing zeros, `,` thousands separator.
pub fn fmt_btc(d: &Decimal) -> String {
    let d = d.round_dp(8).normalize();
    let digits = d.abs().to_string();
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (digits, None),
    };
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if d.is_sign_negative() && !d.is_zero() { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn fmt_usd(d: &Decimal) -> String {
    format!("USD {}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Drops sub-microsecond precision so a timestamp survives a storage round trip.
pub fn truncate_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(ts.nanosecond() / 1_000 * 1_000)
        .unwrap_or(ts)
}

/// Fixed-width RFC 3339, so lexical order in SQLite equals time order.
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_timestamp(field: &'static str, s: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| PersistenceError::Corrupt {
            field,
            value: s.to_string(),
        })
}

pub fn from_db_decimal(field: &'static str, s: &str) -> Result<Decimal, PersistenceError> {
    s.parse::<Decimal>().map_err(|_| PersistenceError::Corrupt {
        field,
        value: s.to_string(),
    })
}

pub fn get_setting(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key=?1",
        params![key],
        |r| r.get(0),
    )
    .optional()
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btc_amount_groups_and_trims() {
        let d: Decimal = "12345.67800000".parse().unwrap();
        assert_eq!(fmt_btc(&d), "12,345.678");
        let d: Decimal = "-0.001".parse().unwrap();
        assert_eq!(fmt_btc(&d), "-0.001");
        let d: Decimal = "1000000".parse().unwrap();
        assert_eq!(fmt_btc(&d), "1,000,000");
        let d: Decimal = "0.123456789".parse().unwrap();
        assert_eq!(fmt_btc(&d), "0.12345679");
    }

    #[test]
    fn comma_is_a_decimal_separator() {
        assert_eq!(parse_btc_amount("0,05").unwrap(), "0.05".parse::<Decimal>().unwrap());
        assert!(matches!(
            parse_btc_amount("abc"),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn timestamps_sort_lexically() {
        let a = DateTime::parse_from_rfc3339("2024-03-18T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2024-03-18T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let (sa, sb) = (to_db_timestamp(&a), to_db_timestamp(&b));
        assert_eq!(sa.len(), sb.len());
        assert!(sa < sb);
        assert_eq!(from_db_timestamp("date", &sb).unwrap(), b);
    }
}
