// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::db::decimal_at;
use crate::error::Result;
use crate::models::ExchangeRate;

fn from_row(r: &Row<'_>) -> rusqlite::Result<ExchangeRate> {
    Ok(ExchangeRate {
        id: r.get(0)?,
        base_currency_id: r.get(1)?,
        target_currency_id: r.get(2)?,
        rate: decimal_at(r, 3)?,
        last_updated: r.get(4)?,
    })
}

pub fn find(conn: &Connection, base: i64, target: i64) -> Result<Option<ExchangeRate>> {
    Ok(conn
        .query_row(
            "SELECT id, base_currency_id, target_currency_id, rate, last_updated
             FROM exchange_rates WHERE base_currency_id=?1 AND target_currency_id=?2",
            params![base, target],
            from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> Result<Vec<ExchangeRate>> {
    let mut stmt = conn.prepare(
        "SELECT id, base_currency_id, target_currency_id, rate, last_updated
         FROM exchange_rates ORDER BY base_currency_id, target_currency_id",
    )?;
    let rows = stmt.query_map([], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Insert or replace the single row stored for (base, target).
pub fn upsert(
    conn: &Connection,
    base: i64,
    target: i64,
    rate: Decimal,
    at: DateTime<Utc>,
) -> Result<ExchangeRate> {
    conn.execute(
        "INSERT INTO exchange_rates(base_currency_id, target_currency_id, rate, last_updated)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(base_currency_id, target_currency_id)
         DO UPDATE SET rate=excluded.rate, last_updated=excluded.last_updated",
        params![base, target, rate.to_string(), at],
    )?;
    let stored = conn.query_row(
        "SELECT id, base_currency_id, target_currency_id, rate, last_updated
         FROM exchange_rates WHERE base_currency_id=?1 AND target_currency_id=?2",
        params![base, target],
        from_row,
    )?;
    Ok(stored)
}
