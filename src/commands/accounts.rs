// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::{App, arg, id_arg};
use crate::currencies;
use crate::ledger::{self, NewAccount};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(app: &App, conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let currency = currencies::require_code(conn, arg(sub, "currency")?)?;
            let initial_balance = match sub.get_one::<String>("balance") {
                Some(b) => parse_decimal(b)?,
                None => Decimal::ZERO,
            };
            let account = ledger::create_account(
                conn,
                &NewAccount {
                    user_id: user.id,
                    currency_id: currency.id,
                    name: sub.get_one::<String>("name").cloned(),
                    initial_balance,
                    is_default: sub.get_flag("default"),
                },
            )?;
            println!(
                "Added account #{} '{}' ({}){}",
                account.id,
                account.name,
                currency.code,
                if account.is_default { " [default]" } else { "" }
            );
        }
        Some(("list", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let accounts = ledger::list_accounts(conn, user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let mut data = Vec::new();
                for a in &accounts {
                    let ccy = currencies::require(conn, a.currency_id)?;
                    data.push(vec![
                        a.id.to_string(),
                        a.name.clone(),
                        ccy.code.clone(),
                        fmt_money(&a.balance, &ccy.symbol),
                        if a.is_default { "*".into() } else { String::new() },
                    ]);
                }
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Currency", "Balance", "Default"], data)
                );
            }
        }
        Some(("set-default", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let account = ledger::set_default(conn, user.id, id_arg(sub, "id")?)?;
            println!("Account #{} '{}' is now the default", account.id, account.name);
        }
        _ => {}
    }
    Ok(())
}
