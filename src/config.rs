// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed view over the `settings` table.

use rusqlite::Connection;
use std::time::Duration;

use crate::error::ConfigError;
use crate::utils::{get_setting, set_setting};

pub const DEFAULT_PRICE_ENDPOINT: &str = "https://api.coindesk.com/v1/bpi/currentprice.json";

pub const KEYS: [&str; 4] = [
    "price_endpoint",
    "page_size",
    "refresh_after_hours",
    "http_timeout_secs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub price_endpoint: String,
    pub page_size: usize,
    pub refresh_after_hours: i64,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            price_endpoint: DEFAULT_PRICE_ENDPOINT.to_string(),
            page_size: 20,
            refresh_after_hours: 1,
            http_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Stored values override the defaults; unreadable ones are reported.
    pub fn load(conn: &Connection) -> Result<Self, ConfigError> {
        let mut s = Settings::default();
        for key in KEYS {
            if let Some(value) = get_setting(conn, key)? {
                s.apply(key, &value)?;
            }
        }
        Ok(s)
    }

    /// Validates and persists one setting.
    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut candidate = Settings::default();
        candidate.apply(key, value)?;
        set_setting(conn, key, value.trim())?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "price_endpoint" => self.price_endpoint.clone(),
            "page_size" => self.page_size.to_string(),
            "refresh_after_hours" => self.refresh_after_hours.to_string(),
            "http_timeout_secs" => self.http_timeout_secs.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "price_endpoint" => {
                if reqwest::Url::parse(value).is_err() {
                    return Err(invalid("price_endpoint", value, "not a URL"));
                }
                self.price_endpoint = value.to_string();
            }
            "page_size" => {
                self.page_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid("page_size", value, "expected a positive integer"))?;
            }
            "refresh_after_hours" => {
                self.refresh_after_hours = value
                    .parse::<i64>()
                    .ok()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| {
                        invalid("refresh_after_hours", value, "expected a whole number of hours")
                    })?;
            }
            "http_timeout_secs" => {
                self.http_timeout_secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        invalid("http_timeout_secs", value, "expected a positive integer")
                    })?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn defaults_without_rows() {
        let conn = db::open_in_memory().unwrap();
        assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
    }

    #[test]
    fn stored_values_override_defaults() {
        let conn = db::open_in_memory().unwrap();
        Settings::set(&conn, "page_size", "5").unwrap();
        Settings::set(&conn, "price_endpoint", "http://127.0.0.1:9/price.json").unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.page_size, 5);
        assert_eq!(s.price_endpoint, "http://127.0.0.1:9/price.json");
        assert_eq!(s.get("page_size").unwrap(), "5");
    }

    #[test]
    fn bad_values_are_not_persisted() {
        let conn = db::open_in_memory().unwrap();
        assert!(matches!(
            Settings::set(&conn, "page_size", "0"),
            Err(ConfigError::InvalidValue { key: "page_size", .. })
        ));
        assert!(matches!(
            Settings::set(&conn, "colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(Settings::load(&conn).unwrap().page_size, 20);
    }
}
