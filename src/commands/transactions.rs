// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use super::{App, arg, id_arg, period};
use crate::ledger::AccountSelector;
use crate::models::{Transaction, TransactionKind};
use crate::transactions::{self, NewTransaction};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(app: &App, conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let kind: TransactionKind = arg(sub, "type")?.parse()?;
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let date = match sub.get_one::<String>("date") {
                Some(d) => parse_date(d)?,
                None => Utc::now().date_naive(),
            };
            let new = NewTransaction {
                user_id: user.id,
                category_id: id_arg(sub, "category")?,
                account: AccountSelector::from(sub.get_one::<i64>("account").copied()),
                amount,
                description: sub
                    .get_one::<String>("description")
                    .cloned()
                    .unwrap_or_default(),
                date,
                kind,
            };
            let t = transactions::create_transaction(conn, &new)?;
            println!(
                "Recorded {} #{} of {} on {} (account #{})",
                t.kind, t.id, t.amount, t.date, t.account_id
            );
        }
        Some(("list", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let has_period = ["from", "to", "month"]
                .iter()
                .any(|id| sub.get_one::<String>(id).is_some());
            let mut txs = if let Some(account) = sub.get_one::<i64>("account") {
                transactions::list_for_account(conn, user.id, *account)?
            } else if sub.get_flag("default-account") {
                if has_period {
                    let (start, end) = period(sub)?;
                    transactions::list_for_default_account_period(conn, user.id, start, end)?
                } else {
                    transactions::list_for_default_account(conn, user.id)?
                }
            } else if has_period {
                let (start, end) = period(sub)?;
                transactions::list_for_period(conn, user.id, start, end)?
            } else if let Some(limit) = sub.get_one::<usize>("limit") {
                transactions::recent(conn, user.id, *limit)?
            } else {
                transactions::list_for_user(conn, user.id)?
            };
            if let Some(limit) = sub.get_one::<usize>("limit") {
                txs.truncate(*limit);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &txs)? {
                println!("{}", table(&txs));
            }
        }
        Some(("show", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let t = transactions::get_for_user(conn, user.id, id_arg(sub, "id")?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &t)? {
                println!("{}", table(std::slice::from_ref(&t)));
            }
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn table(txs: &[Transaction]) -> comfy_table::Table {
    let data = txs
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.to_string(),
                t.kind.to_string(),
                format!("{:.2}", t.amount),
                t.category_id.to_string(),
                t.account_id.to_string(),
                t.description.clone(),
            ]
        })
        .collect();
    pretty_table(
        &["ID", "Date", "Type", "Amount", "Category", "Account", "Description"],
        data,
    )
}
