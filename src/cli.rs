// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("btcledger")
        .about("Bitcoin income/expense ledger with a cached BTC/USD rate")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("BTCLEDGER_DB")
                .value_parser(value_parser!(std::path::PathBuf))
                .help("SQLite database path (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .help("Log level when RUST_LOG is not set"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("add")
                .about("Record an expense")
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("Amount spent in BTC"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("groceries|taxi|electronics|restaurant|other"),
                ),
        )
        .subcommand(
            Command::new("replenish").about("Record income").arg(
                Arg::new("amount")
                    .long("amount")
                    .required(true)
                    .allow_hyphen_values(true)
                    .help("Amount received in BTC"),
            ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("Transactions grouped by day, newest first")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Page size (defaults to the page_size setting)"),
                )
                .arg(
                    Arg::new("pages")
                        .long("pages")
                        .value_parser(value_parser!(usize))
                        .default_value("1")
                        .conflicts_with("all")
                        .help("Number of pages to load"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Load every page"),
                ),
        ))
        .subcommand(json_flags(
            Command::new("balance")
                .about("Wallet balance and BTC/USD rate")
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .action(ArgAction::SetTrue)
                        .help("Do not refresh a stale rate"),
                ),
        ))
        .subcommand(
            Command::new("rate")
                .about("Cached BTC/USD rate")
                .subcommand(Command::new("show").about("Show the cached rate"))
                .subcommand(
                    Command::new("refresh").about("Fetch the current rate").arg(
                        Arg::new("force")
                            .long("force")
                            .action(ArgAction::SetTrue)
                            .help("Fetch even if the cached rate is fresh"),
                    ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Settings stored in the database")
                .subcommand(
                    Command::new("get").arg(Arg::new("key").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true).allow_hyphen_values(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check ledger invariants"))
}
