// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use super::{App, arg};
use crate::auth::{self, NewUser};
use crate::currencies;
use crate::models::{Account, User};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Serialize)]
struct WhoAmI<'a> {
    user: &'a User,
    accounts: &'a [Account],
}

pub fn handle(app: &App, conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => {
            let user = auth::register(
                conn,
                &NewUser {
                    username: arg(sub, "username")?.to_string(),
                    email: arg(sub, "email")?.to_string(),
                    password: arg(sub, "password")?.to_string(),
                },
            )?;
            println!("Registered user #{} <{}>", user.id, user.email);
        }
        Some(("login", sub)) => {
            let (user, token) = app.auth.login(conn, arg(sub, "email")?, arg(sub, "password")?)?;
            eprintln!("Logged in as {} (user #{})", user.username, user.id);
            println!("{}", token);
        }
        Some(("logout", _)) => {
            if let Some(token) = m.get_one::<String>("token") {
                app.auth.logout(conn, token)?;
            }
            println!("Logged out");
        }
        Some(("whoami", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let (user, accounts) = auth::user_with_accounts(conn, user.id)?;
            let out = WhoAmI {
                user: &user,
                accounts: &accounts,
            };
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
                let default_ccy = match user.default_currency_id {
                    Some(id) => currencies::require(conn, id)?.code,
                    None => "-".into(),
                };
                println!(
                    "{} <{}>  user #{}  default currency {}",
                    user.username, user.email, user.id, default_ccy
                );
                let mut rows = Vec::new();
                for a in &accounts {
                    let ccy = currencies::require(conn, a.currency_id)?;
                    rows.push(vec![
                        a.id.to_string(),
                        a.name.clone(),
                        fmt_money(&a.balance, &ccy.code),
                        if a.is_default { "yes".into() } else { String::new() },
                    ]);
                }
                println!("{}", pretty_table(&["ID", "Account", "Balance", "Default"], rows));
            }
        }
        Some(("set-currency", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let currency = currencies::require_code(conn, arg(sub, "code")?)?;
            match auth::set_default_currency(conn, user.id, currency.id)? {
                Some(account) => println!(
                    "Default currency set to {}; created default account #{} '{}'",
                    currency.code, account.id, account.name
                ),
                None => println!("Default currency set to {}", currency.code),
            }
        }
        _ => {}
    }
    Ok(())
}
