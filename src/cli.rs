// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .value_name("YYYY-MM-DD")
            .help("Period start (inclusive); defaults to the first day of this month"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .value_name("YYYY-MM-DD")
            .help("Period end (inclusive); defaults to today"),
    )
    .arg(
        Arg::new("month")
            .long("month")
            .value_name("YYYY-MM")
            .conflicts_with_all(["from", "to"])
            .help("Whole calendar month"),
    )
}

fn user_cmd() -> Command {
    Command::new("user")
        .about("Register, log in and manage the current user")
        .subcommand_required(true)
        .subcommand(
            Command::new("register")
                .about("Create a new user")
                .arg(Arg::new("username").long("username").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("FINTRACK_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Open a session and print its bearer token")
                .arg(Arg::new("email").long("email").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("FINTRACK_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Close the current session"))
        .subcommand(json_args(
            Command::new("whoami").about("Show the current user and their accounts"),
        ))
        .subcommand(
            Command::new("set-currency")
                .about("Set the default currency; creates a default account if none exists")
                .arg(Arg::new("code").required(true)),
        )
}

fn currency_cmd() -> Command {
    Command::new("currency")
        .about("Currency directory")
        .subcommand_required(true)
        .subcommand(json_args(Command::new("list").about("List currencies")))
        .subcommand(
            Command::new("add")
                .about("Register a currency")
                .arg(Arg::new("code").required(true))
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("symbol").long("symbol").required(true)),
        )
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Open an account")
                .arg(Arg::new("currency").long("currency").required(true))
                .arg(Arg::new("name").long("name"))
                .arg(
                    Arg::new("balance")
                        .long("balance")
                        .allow_hyphen_values(true)
                        .help("Opening balance"),
                )
                .arg(
                    Arg::new("default")
                        .long("default")
                        .action(ArgAction::SetTrue)
                        .help("Make this the default account"),
                ),
        )
        .subcommand(json_args(Command::new("list").about("List accounts")))
        .subcommand(
            Command::new("set-default")
                .about("Make an account the default")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a personal category")
                .arg(Arg::new("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                )
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(json_args(
            Command::new("list").about("List personal and shared categories"),
        ))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and inspect transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record income or an expense")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("category")
                        .long("category")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("account")
                        .long("account")
                        .value_parser(value_parser!(i64))
                        .help("Account id; the default account when omitted"),
                )
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD; defaults to today"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(json_args(period_args(
            Command::new("list")
                .about("List transactions")
                .arg(
                    Arg::new("account")
                        .long("account")
                        .value_parser(value_parser!(i64))
                        .conflicts_with("default-account"),
                )
                .arg(
                    Arg::new("default-account")
                        .long("default-account")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        )))
        .subcommand(json_args(
            Command::new("show")
                .about("Show one transaction")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Summaries and aggregations")
        .subcommand_required(true)
        .subcommand(json_args(period_args(
            Command::new("summary")
                .about("Income, expense and net for a period")
                .arg(
                    Arg::new("default-account")
                        .long("default-account")
                        .action(ArgAction::SetTrue),
                ),
        )))
        .subcommand(json_args(period_args(
            Command::new("by-category").about("Totals per category for a period"),
        )))
        .subcommand(json_args(
            Command::new("monthly").about("Twelve monthly totals").arg(
                Arg::new("year")
                    .long("year")
                    .value_parser(value_parser!(i32))
                    .help("Defaults to the current year"),
            ),
        ))
        .subcommand(json_args(period_args(
            Command::new("dashboard").about("Summary, categories and recent transactions"),
        )))
}

fn fx_cmd() -> Command {
    Command::new("fx")
        .about("Exchange rates and conversion")
        .subcommand_required(true)
        .subcommand(json_args(
            Command::new("rate")
                .about("Resolve the rate for 1 BASE in TARGET")
                .arg(Arg::new("base").required(true))
                .arg(Arg::new("target").required(true)),
        ))
        .subcommand(json_args(
            Command::new("rates").about("List stored rates, refreshing stale ones"),
        ))
        .subcommand(
            Command::new("set")
                .about("Record a rate manually")
                .arg(Arg::new("base").required(true))
                .arg(Arg::new("target").required(true))
                .arg(Arg::new("rate").required(true)),
        )
        .subcommand(json_args(
            Command::new("convert")
                .about("Convert an amount between currencies")
                .arg(Arg::new("amount").required(true))
                .arg(Arg::new("from").required(true))
                .arg(Arg::new("to").required(true)),
        ))
        .subcommand(json_args(
            Command::new("convert-accounts")
                .about("Convert an amount between two of your accounts")
                .arg(Arg::new("amount").required(true))
                .arg(
                    Arg::new("from")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("to").required(true).value_parser(value_parser!(i64))),
        ))
        .subcommand(json_args(
            Command::new("balances").about("Account balances in the pivot currency"),
        ))
        .subcommand(json_args(
            Command::new("refresh").about("Fetch the latest rates from the provider"),
        ))
        .subcommand(
            Command::new("watch")
                .about("Refresh rates on a fixed interval until interrupted")
                .arg(
                    Arg::new("interval-hours")
                        .long("interval-hours")
                        .value_parser(value_parser!(u64))
                        .help("Overrides FINTRACK_REFRESH_INTERVAL_HOURS"),
                ),
        )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Personal finance tracker: accounts, transactions and multi-currency rates")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .env("FINTRACK_TOKEN")
                .hide_env_values(true)
                .help("Session token from `user login`"),
        )
        .subcommand(Command::new("init").about("Create the database and seed reference data"))
        .subcommand(user_cmd())
        .subcommand(currency_cmd())
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(report_cmd())
        .subcommand(fx_cmd())
        .subcommand(Command::new("doctor").about("Check data consistency"))
}
