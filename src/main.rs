// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use btcledger::{cli, commands, db};

fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    init_logger(level);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// The single line printed for a failed command, context chain included.
fn failure_message(e: &anyhow::Error) -> String {
    format!("Error: {e:#}")
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let path = db::resolve_path(matches.get_one::<PathBuf>("db").map(PathBuf::as_path))?;
    let conn = db::open_or_init(&path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("add", sub)) => commands::transactions::add(&conn, sub)?,
        Some(("replenish", sub)) => commands::transactions::replenish(&conn, sub)?,
        Some(("list", sub)) => commands::transactions::list(&conn, sub)?,
        Some(("balance", sub)) => commands::wallet::balance(&conn, sub)?,
        Some(("rate", sub)) => commands::wallet::handle_rate(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

/// RUST_LOG wins when set; otherwise `level` applies to this crate only.
/// The library and binary share the crate name, so one directive covers both.
fn init_logger(level: &str) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn failure_is_one_line_with_context() {
        let err = Err::<(), _>(anyhow!("Expense transactions require a category"))
            .context("Failed to save transaction")
            .unwrap_err();
        let msg = failure_message(&err);
        assert_eq!(
            msg,
            "Error: Failed to save transaction: Expense transactions require a category"
        );
        assert_eq!(msg.lines().count(), 1);
    }
}
