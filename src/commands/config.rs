// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::required;
use crate::config::{Settings, KEYS};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            println!("{}", Settings::load(conn)?.get(key)?);
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            Settings::set(conn, key, value)?;
            println!("Set {} = {}", key, value.trim());
        }
        Some(("list", _)) => {
            let settings = Settings::load(conn)?;
            let mut rows = Vec::new();
            for key in KEYS {
                rows.push(vec![key.to_string(), settings.get(key)?]);
            }
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
