// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{App, arg};
use crate::categories::{self, NewCategory};
use crate::models::TransactionKind;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(app: &App, conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let kind: TransactionKind = arg(sub, "type")?.parse()?;
            let category = categories::create(
                conn,
                &NewCategory {
                    user_id: Some(user.id),
                    name: arg(sub, "name")?.to_string(),
                    description: sub
                        .get_one::<String>("description")
                        .cloned()
                        .unwrap_or_default(),
                    kind,
                },
            )?;
            println!("Added {} category #{} '{}'", kind, category.id, category.name);
        }
        Some(("list", sub)) => {
            let user = app.authenticate(conn, sub)?;
            let cats = categories::list_for_user(conn, user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name,
                            c.kind.to_string(),
                            if c.user_id.is_some() { "own" } else { "shared" }.to_string(),
                            c.description,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Type", "Scope", "Description"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
