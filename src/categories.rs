// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{FinanceError, Result};
use crate::models::{Category, TransactionKind};

const COLUMNS: &str = "id, user_id, name, description, type, created_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        description: r.get(3)?,
        kind: r.get(4)?,
        created_at: r.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    /// `None` creates a global category.
    pub user_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub kind: TransactionKind,
}

pub fn create(conn: &Connection, new: &NewCategory) -> Result<Category> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(FinanceError::Validation("category name is required".into()));
    }
    conn.execute(
        "INSERT INTO categories(user_id, name, description, type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.user_id, name, new.description.trim(), new.kind, Utc::now()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(FinanceError::CategoryNotFound(id))
}

/// The user's own categories plus the global ones.
pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM categories WHERE user_id=?1 OR user_id IS NULL ORDER BY type, name"
    ))?;
    let rows = stmt.query_map(params![user_id], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Category>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM categories WHERE id=?1"),
            params![id],
            from_row,
        )
        .optional()?)
}

/// A category the user may book against: global or owned by them.
pub fn visible_to(conn: &Connection, user_id: i64, id: i64) -> Result<Category> {
    match get(conn, id)? {
        Some(c) if c.user_id.is_none_or(|owner| owner == user_id) => Ok(c),
        _ => Err(FinanceError::CategoryNotFound(id)),
    }
}
