// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::arg;
use crate::currencies::{self, NewCurrency};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let all = currencies::list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &all)? {
                let data = all
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.code, c.name, c.symbol])
                    .collect();
                println!("{}", pretty_table(&["ID", "Code", "Name", "Symbol"], data));
            }
        }
        Some(("add", sub)) => {
            let c = currencies::create(
                conn,
                &NewCurrency {
                    code: arg(sub, "code")?.to_string(),
                    name: arg(sub, "name")?.to_string(),
                    symbol: arg(sub, "symbol")?.to_string(),
                },
            )?;
            println!("Added currency {} ({}) #{}", c.code, c.name, c.id);
        }
        _ => {}
    }
    Ok(())
}
