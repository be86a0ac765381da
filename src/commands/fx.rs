// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;

use super::{App, arg, id_arg};
use crate::config::refresh_interval_hours;
use crate::currencies;
use crate::fx::{Conversion, RefreshScheduler};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};

pub fn handle(app: &App, conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let resolver = app.resolver(conn);
    match m.subcommand() {
        Some(("rate", sub)) => {
            let base = currencies::require_code(conn, arg(sub, "base")?)?;
            let target = currencies::require_code(conn, arg(sub, "target")?)?;
            let r = resolver.resolve(base.id, target.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
                println!(
                    "1 {} = {} {}  ({:?}, updated {})",
                    base.code,
                    r.rate,
                    target.code,
                    r.source,
                    r.last_updated.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        Some(("rates", sub)) => {
            let rates = resolver.all_rates()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rates)? {
                let mut data = Vec::new();
                for r in &rates {
                    data.push(vec![
                        currencies::require(conn, r.base_currency_id)?.code,
                        currencies::require(conn, r.target_currency_id)?.code,
                        r.rate.to_string(),
                        r.last_updated.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                println!("{}", pretty_table(&["Base", "Target", "Rate", "Updated"], data));
            }
        }
        Some(("set", sub)) => {
            let base = currencies::require_code(conn, arg(sub, "base")?)?;
            let target = currencies::require_code(conn, arg(sub, "target")?)?;
            let rate = parse_decimal(arg(sub, "rate")?)?;
            resolver.set_rate(base.id, target.id, rate)?;
            println!("Set 1 {} = {} {}", base.code, rate, target.code);
        }
        Some(("convert", sub)) => {
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let from = currencies::require_code(conn, arg(sub, "from")?)?;
            let to = currencies::require_code(conn, arg(sub, "to")?)?;
            let c = resolver.convert(amount, from.id, to.id)?;
            print_conversion(sub, &c)?;
        }
        Some(("convert-accounts", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let c = resolver.convert_between_accounts(
                user.id,
                id_arg(sub, "from")?,
                id_arg(sub, "to")?,
                amount,
            )?;
            print_conversion(sub, &c)?;
        }
        Some(("balances", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let pivot = resolver.pivot_currency()?;
            let balances = resolver.balances_in_pivot(user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &balances)? {
                let data = balances
                    .into_iter()
                    .map(|b| {
                        vec![
                            b.account_name,
                            b.currency_code,
                            format!("{:.2}", b.balance),
                            b.balance_in_pivot
                                .map(|v| format!("{:.2}", v))
                                .unwrap_or_else(|| "n/a".into()),
                        ]
                    })
                    .collect();
                let in_pivot = format!("In {}", pivot.code);
                println!(
                    "{}",
                    pretty_table(&["Account", "CCY", "Balance", &in_pivot], data)
                );
            }
        }
        Some(("refresh", sub)) => {
            let report = resolver.refresh_all()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                println!(
                    "Refreshed {} rates from {}",
                    report.updated.len(),
                    report.pivot
                );
                if !report.missing.is_empty() {
                    println!("Not quoted by provider: {}", report.missing.join(", "));
                }
                if !report.failed.is_empty() {
                    println!("Failed to save: {}", report.failed.join(", "));
                }
            }
        }
        Some(("watch", sub)) => {
            let mut settings = app.config.fx.clone();
            if let Some(hours) = sub.get_one::<u64>("interval-hours") {
                settings.refresh_interval = refresh_interval_hours(*hours)?;
            }
            println!(
                "Refreshing rates every {}h; press Ctrl-C to stop",
                settings.refresh_interval.as_secs() / 3600
            );
            let scheduler = RefreshScheduler::spawn(
                app.config.db_path.clone(),
                settings,
                Arc::clone(&app.provider),
            )
            .context("Failed to start the refresh thread")?;
            scheduler.wait();
        }
        _ => {}
    }
    Ok(())
}

fn print_conversion(sub: &clap::ArgMatches, c: &Conversion) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), c)? {
        println!(
            "{} {} = {:.2} {}  (rate {})",
            c.amount, c.from_currency, c.converted_amount, c.to_currency, c.rate
        );
    }
    Ok(())
}
