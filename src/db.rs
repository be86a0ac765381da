// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Fintrack", "fintrack"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fintrack.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create data dir {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS currencies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        default_currency_id INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(default_currency_id) REFERENCES currencies(id)
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        currency_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(currency_id) REFERENCES currencies(id)
    );
    CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);
    -- at most one default account per user
    CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_single_default
        ON accounts(user_id) WHERE is_default = 1;

    -- directional: 1 base = rate target
    CREATE TABLE IF NOT EXISTS exchange_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_currency_id INTEGER NOT NULL,
        target_currency_id INTEGER NOT NULL,
        rate TEXT NOT NULL,
        last_updated TEXT NOT NULL,
        UNIQUE(base_currency_id, target_currency_id),
        FOREIGN KEY(base_currency_id) REFERENCES currencies(id) ON DELETE CASCADE,
        FOREIGN KEY(target_currency_id) REFERENCES currencies(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

    CREATE TABLE IF NOT EXISTS sessions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        token TEXT NOT NULL UNIQUE,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    "#,
    )?;
    seed_reference_data(conn)?;
    Ok(())
}

const SEED_CURRENCIES: &[(&str, &str, &str)] = &[
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
    ("JPY", "Japanese Yen", "¥"),
    ("CNY", "Chinese Yuan", "¥"),
    ("CHF", "Swiss Franc", "Fr"),
    ("RUB", "Russian Ruble", "₽"),
];

const SEED_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Salary", "Regular employment income", "income"),
    ("Gifts", "Money received as gifts", "income"),
    ("Food", "Groceries and dining", "expense"),
    ("Transport", "Public transit, fuel, taxis", "expense"),
    ("Housing", "Rent, utilities, maintenance", "expense"),
    ("Entertainment", "Leisure and subscriptions", "expense"),
];

fn seed_reference_data(conn: &mut Connection) -> Result<()> {
    let now = chrono::Utc::now();
    let tx = conn.transaction()?;
    for (code, name, symbol) in SEED_CURRENCIES {
        tx.execute(
            "INSERT OR IGNORE INTO currencies(code, name, symbol, created_at) VALUES (?1, ?2, ?3, ?4)",
            (code, name, symbol, now),
        )?;
    }
    let seeded: i64 =
        tx.query_row("SELECT COUNT(*) FROM categories WHERE user_id IS NULL", [], |r| {
            r.get(0)
        })?;
    if seeded == 0 {
        for (name, description, kind) in SEED_CATEGORIES {
            tx.execute(
                "INSERT INTO categories(user_id, name, description, type, created_at)
                 VALUES (NULL, ?1, ?2, ?3, ?4)",
                (name, description, kind, now),
            )?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Read a TEXT column holding a decimal.
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
