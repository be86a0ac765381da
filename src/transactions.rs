// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recording income/expense transactions and reading them back.

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::info;

use crate::categories;
use crate::db::decimal_at;
use crate::error::{FinanceError, Result};
use crate::ledger::{self, AccountSelector};
use crate::models::{Transaction, TransactionKind};

const COLUMNS: &str =
    "id, user_id, category_id, account_id, amount, description, date, type, created_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category_id: r.get(2)?,
        account_id: r.get(3)?,
        amount: decimal_at(r, 4)?,
        description: r.get(5)?,
        date: r.get(6)?,
        kind: r.get(7)?,
        created_at: r.get(8)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub category_id: i64,
    pub account: AccountSelector,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// Validate and record a transaction together with its balance effect.
///
/// The insert and the balance update share one SQLite transaction: any
/// failure rolls back both, so a row never exists without its balance
/// change and vice versa.
pub fn create_transaction(conn: &mut Connection, new: &NewTransaction) -> Result<Transaction> {
    if new.amount <= Decimal::ZERO {
        return Err(FinanceError::Validation(format!(
            "amount must be positive, got {}",
            new.amount
        )));
    }

    let tx = conn.transaction()?;

    let category = categories::visible_to(&tx, new.user_id, new.category_id)?;
    if category.kind != new.kind {
        return Err(FinanceError::CategoryTypeMismatch {
            category: category.kind.to_string(),
            transaction: new.kind.to_string(),
        });
    }

    let account = ledger::resolve_account(&tx, new.user_id, new.account)?;

    tx.execute(
        "INSERT INTO transactions(user_id, category_id, account_id, amount, description, date, type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.user_id,
            category.id,
            account.id,
            new.amount.to_string(),
            new.description.trim(),
            new.date,
            new.kind,
            Utc::now()
        ],
    )?;
    let id = tx.last_insert_rowid();

    let balance = ledger::adjust_balance(&tx, account.id, new.amount, new.kind.is_income())?;
    let created = tx.query_row(
        &format!("SELECT {COLUMNS} FROM transactions WHERE id=?1"),
        params![id],
        from_row,
    )?;
    tx.commit()?;

    info!(
        transaction = id,
        account = account.id,
        kind = %new.kind,
        amount = %new.amount,
        balance = %balance,
        "transaction recorded"
    );
    Ok(created)
}

fn query(conn: &Connection, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions WHERE {filter} ORDER BY date DESC, created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args, from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn check_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(FinanceError::Validation(format!(
            "period start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Transaction>> {
    query(conn, "user_id=?1", &[&user_id])
}

/// Transactions dated within `[start, end]`, both ends inclusive.
pub fn list_for_period(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    check_period(start, end)?;
    query(
        conn,
        "user_id=?1 AND date BETWEEN ?2 AND ?3",
        &[&user_id, &start, &end],
    )
}

/// A single transaction; rows of other users are reported as not found.
pub fn get_for_user(conn: &Connection, user_id: i64, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM transactions WHERE id=?1 AND user_id=?2"),
        params![id, user_id],
        from_row,
    )
    .optional()?
    .ok_or(FinanceError::TransactionNotFound(id))
}

pub fn list_for_account(conn: &Connection, user_id: i64, account_id: i64) -> Result<Vec<Transaction>> {
    let account = ledger::owned_account(conn, user_id, account_id)?;
    query(conn, "account_id=?1", &[&account.id])
}

/// Empty when the user has no default account yet.
pub fn list_for_default_account(conn: &Connection, user_id: i64) -> Result<Vec<Transaction>> {
    match ledger::default_account(conn, user_id)? {
        Some(account) => query(conn, "account_id=?1", &[&account.id]),
        None => Ok(Vec::new()),
    }
}

pub fn list_for_default_account_period(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    check_period(start, end)?;
    match ledger::default_account(conn, user_id)? {
        Some(account) => query(
            conn,
            "account_id=?1 AND date BETWEEN ?2 AND ?3",
            &[&account.id, &start, &end],
        ),
        None => Ok(Vec::new()),
    }
}

/// The `limit` most recent transactions of the user.
pub fn recent(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Transaction>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM transactions WHERE user_id=?1
         ORDER BY date DESC, created_at DESC, id DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id, limit], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
