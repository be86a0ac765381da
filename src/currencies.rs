// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Currency directory: immutable reference data looked up by id or ISO code.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{FinanceError, Result};
use crate::models::Currency;

const COLUMNS: &str = "id, code, name, symbol, created_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: r.get(0)?,
        code: r.get(1)?,
        name: r.get(2)?,
        symbol: r.get(3)?,
        created_at: r.get(4)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Currency>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM currencies ORDER BY code"))?;
    let rows = stmt.query_map([], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Currency>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM currencies WHERE id=?1"),
            params![id],
            from_row,
        )
        .optional()?)
}

pub fn by_code(conn: &Connection, code: &str) -> Result<Option<Currency>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM currencies WHERE code=?1"),
            params![code.trim().to_uppercase()],
            from_row,
        )
        .optional()?)
}

pub fn require(conn: &Connection, id: i64) -> Result<Currency> {
    get(conn, id)?.ok_or_else(|| FinanceError::CurrencyNotFound(id.to_string()))
}

pub fn require_code(conn: &Connection, code: &str) -> Result<Currency> {
    by_code(conn, code)?.ok_or_else(|| FinanceError::CurrencyNotFound(code.trim().to_uppercase()))
}

#[derive(Debug, Clone)]
pub struct NewCurrency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

pub fn create(conn: &Connection, new: &NewCurrency) -> Result<Currency> {
    let code = new.code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FinanceError::Validation(format!(
            "currency code must be three letters, got '{}'",
            new.code
        )));
    }
    if new.name.trim().is_empty() || new.symbol.trim().is_empty() {
        return Err(FinanceError::Validation(
            "currency name and symbol are required".into(),
        ));
    }
    if by_code(conn, &code)?.is_some() {
        return Err(FinanceError::Validation(format!(
            "currency '{}' already exists",
            code
        )));
    }
    conn.execute(
        "INSERT INTO currencies(code, name, symbol, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![code, new.name.trim(), new.symbol.trim(), Utc::now()],
    )?;
    require(conn, conn.last_insert_rowid())
}
