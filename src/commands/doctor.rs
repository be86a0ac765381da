// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, params};

use super::App;
use crate::auth;
use crate::currencies;
use crate::fx::rates;
use crate::utils::pretty_table;

pub fn handle(app: &App, conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Users with accounts but not exactly one default
    let mut stmt = conn.prepare(
        "SELECT user_id, SUM(is_default) FROM accounts GROUP BY user_id HAVING SUM(is_default) != 1",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let user: i64 = r.get(0)?;
        let defaults: i64 = r.get(1)?;
        rows.push(vec![
            "default_account_count".into(),
            format!("user {} has {} default accounts", user, defaults),
        ]);
    }

    // 2) Currencies with no rate from or to the pivot
    let resolver = app.resolver(conn);
    match resolver.pivot_currency() {
        Ok(pivot) => {
            for c in currencies::list(conn)?.into_iter().filter(|c| c.id != pivot.id) {
                let covered = rates::find(conn, pivot.id, c.id)?.is_some()
                    || rates::find(conn, c.id, pivot.id)?.is_some();
                if !covered {
                    rows.push(vec!["missing_pivot_rate".into(), format!("{}/{}", pivot.code, c.code)]);
                }
            }
        }
        Err(e) => rows.push(vec!["missing_pivot_currency".into(), e.to_string()]),
    }

    // 3) Stale rates
    for r in rates::list(conn)? {
        if resolver.is_stale(r.last_updated) {
            rows.push(vec![
                "stale_rate".into(),
                format!(
                    "{}/{} last updated {}",
                    currencies::require(conn, r.base_currency_id)?.code,
                    currencies::require(conn, r.target_currency_id)?.code,
                    r.last_updated.format("%Y-%m-%d %H:%M")
                ),
            ]);
        }
    }

    // 4) Expired sessions still on disk
    let expired: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE expires_at <= ?1",
        params![Utc::now()],
        |r| r.get(0),
    )?;
    if expired > 0 {
        let purged = auth::purge_expired(conn)?;
        rows.push(vec!["expired_sessions".into(), format!("purged {}", purged)]);
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
