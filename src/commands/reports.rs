// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Datelike, Utc};
use rusqlite::Connection;

use super::{App, period};
use crate::models::TransactionSummary;
use crate::summary;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(app: &App, conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let (start, end) = period(sub)?;
            let s = if sub.get_flag("default-account") {
                summary::summary_for_default_account(conn, user.id, start, end)?
            } else {
                summary::summary(conn, user.id, start, end)?
            };
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                println!("{}", summary_table(&s));
            }
        }
        Some(("by-category", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let (start, end) = period(sub)?;
            let rows = summary::by_category(conn, user.id, start, end)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.category_name,
                            c.kind.to_string(),
                            format!("{:.2}", c.total_amount),
                            c.count.to_string(),
                            format!("{:.1}%", c.percentage.round_dp(1)),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Type", "Total", "Count", "Share"], data)
                );
            }
        }
        Some(("monthly", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let year = sub
                .get_one::<i32>("year")
                .copied()
                .unwrap_or_else(|| Utc::now().year());
            let months = summary::monthly(conn, user.id, year)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &months)? {
                let data = months
                    .into_iter()
                    .map(|m| {
                        vec![
                            m.month,
                            format!("{:.2}", m.total_income),
                            format!("{:.2}", m.total_expense),
                            format!("{:.2}", m.net_amount),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Month", "Income", "Expense", "Net"], data)
                );
            }
        }
        Some(("dashboard", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let (start, end) = period(sub)?;
            let d = summary::dashboard(conn, user.id, start, end)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
                println!("{}", summary_table(&d.summary));
                let top = d
                    .by_category
                    .iter()
                    .filter(|c| c.count > 0)
                    .map(|c| {
                        vec![
                            c.category_name.clone(),
                            c.kind.to_string(),
                            format!("{:.2}", c.total_amount),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Type", "Total"], top));
                println!("{}", super::transactions::table(&d.recent_transactions));
            }
        }
        _ => {}
    }
    Ok(())
}

fn summary_table(s: &TransactionSummary) -> comfy_table::Table {
    pretty_table(
        &["Period", "Income", "Expense", "Net", "Transactions"],
        vec![vec![
            format!("{} .. {}", s.period_start, s.period_end),
            format!("{:.2}", s.total_income),
            format!("{:.2}", s.total_expense),
            format!("{:.2}", s.net_amount),
            s.transaction_count.to_string(),
        ]],
    )
}
