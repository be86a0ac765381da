// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account ledger: per-user accounts, the single default account, and the
//! only code path that mutates a balance after creation.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::debug;

use crate::currencies;
use crate::db::decimal_at;
use crate::error::{FinanceError, Result};
use crate::models::Account;

const COLUMNS: &str = "id, user_id, currency_id, name, balance, is_default, created_at, updated_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        currency_id: r.get(2)?,
        name: r.get(3)?,
        balance: decimal_at(r, 4)?,
        is_default: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: i64,
    pub currency_id: i64,
    pub name: Option<String>,
    pub initial_balance: Decimal,
    pub is_default: bool,
}

impl NewAccount {
    pub fn new(user_id: i64, currency_id: i64) -> Self {
        Self {
            user_id,
            currency_id,
            name: None,
            initial_balance: Decimal::ZERO,
            is_default: false,
        }
    }
}

/// How an operation picks the account it works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSelector {
    /// A specific account, which must belong to the caller.
    Explicit(i64),
    /// The caller's default account.
    Default,
}

impl From<Option<i64>> for AccountSelector {
    fn from(id: Option<i64>) -> Self {
        id.map_or(AccountSelector::Default, AccountSelector::Explicit)
    }
}

pub fn create_account(conn: &mut Connection, new: &NewAccount) -> Result<Account> {
    let currency = currencies::require(conn, new.currency_id)?;
    let name = new
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} account", currency.code));

    let tx = conn.transaction()?;
    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id=?1",
        params![new.user_id],
        |r| r.get(0),
    )?;
    // first account is always the default
    let is_default = existing == 0 || new.is_default;
    if existing > 0 && is_default {
        clear_defaults(&tx, new.user_id)?;
    }
    let now = Utc::now();
    tx.execute(
        "INSERT INTO accounts(user_id, currency_id, name, balance, is_default, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            new.user_id,
            currency.id,
            name,
            new.initial_balance.to_string(),
            is_default,
            now
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    debug!(account = id, user = new.user_id, is_default, "account created");
    require_account(conn, id)
}

pub fn list_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE user_id=?1 ORDER BY is_default DESC, id"
    ))?;
    let rows = stmt.query_map(params![user_id], from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM accounts WHERE id=?1"),
            params![id],
            from_row,
        )
        .optional()?)
}

fn require_account(conn: &Connection, id: i64) -> Result<Account> {
    get_account(conn, id)?.ok_or(FinanceError::AccountNotFound(id))
}

/// The account with `id`, provided it belongs to `user_id`.
pub fn owned_account(conn: &Connection, user_id: i64, id: i64) -> Result<Account> {
    let account = require_account(conn, id)?;
    if account.user_id != user_id {
        return Err(FinanceError::AccountOwnershipMismatch {
            account_id: id,
            user_id,
        });
    }
    Ok(account)
}

pub fn default_account(conn: &Connection, user_id: i64) -> Result<Option<Account>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM accounts WHERE user_id=?1 AND is_default=1"),
            params![user_id],
            from_row,
        )
        .optional()?)
}

pub fn resolve_account(
    conn: &Connection,
    user_id: i64,
    selector: AccountSelector,
) -> Result<Account> {
    match selector {
        AccountSelector::Explicit(id) => owned_account(conn, user_id, id),
        AccountSelector::Default => {
            default_account(conn, user_id)?.ok_or(FinanceError::NoDefaultAccount(user_id))
        }
    }
}

pub fn set_default(conn: &mut Connection, user_id: i64, account_id: i64) -> Result<Account> {
    owned_account(conn, user_id, account_id)?;
    let tx = conn.transaction()?;
    clear_defaults(&tx, user_id)?;
    tx.execute(
        "UPDATE accounts SET is_default=1, updated_at=?1 WHERE id=?2 AND user_id=?3",
        params![Utc::now(), account_id, user_id],
    )?;
    tx.commit()?;
    require_account(conn, account_id)
}

fn clear_defaults(conn: &Connection, user_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET is_default=0 WHERE user_id=?1 AND is_default=1",
        params![user_id],
    )?;
    Ok(())
}

/// Apply +amount (income) or -amount (expense) and return the new balance.
/// Negative balances are allowed; leaving the decimal range is not.
pub fn adjust_balance(
    conn: &Connection,
    account_id: i64,
    amount: Decimal,
    is_income: bool,
) -> Result<Decimal> {
    let account = require_account(conn, account_id)?;
    let balance = if is_income {
        account.balance.checked_add(amount)
    } else {
        account.balance.checked_sub(amount)
    }
    .ok_or_else(FinanceError::out_of_range)?;
    conn.execute(
        "UPDATE accounts SET balance=?1, updated_at=?2 WHERE id=?3",
        params![balance.to_string(), Utc::now(), account_id],
    )?;
    Ok(balance)
}
