// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use fintrack::currencies;
use fintrack::error::FinanceError;
use fintrack::ledger::{self, AccountSelector, NewAccount};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    fintrack::db::open_in_memory().unwrap()
}

fn add_user(conn: &Connection, email: &str) -> i64 {
    conn.execute(
        "INSERT INTO users(username, email, password_hash, created_at, updated_at) VALUES (?1, ?2, 'x', ?3, ?3)",
        params![email, email, Utc::now()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn ccy(conn: &Connection, code: &str) -> i64 {
    currencies::require_code(conn, code).unwrap().id
}

fn defaults(conn: &Connection, user: i64) -> Vec<i64> {
    ledger::list_accounts(conn, user)
        .unwrap()
        .into_iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect()
}

#[test]
fn first_account_becomes_default() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = ccy(&conn, "USD");

    let first = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();
    assert!(first.is_default);
    assert_eq!(first.name, "USD account");
    assert_eq!(first.balance, Decimal::ZERO);

    let second = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();
    assert!(!second.is_default);
    assert_eq!(defaults(&conn, user), vec![first.id]);
}

#[test]
fn new_default_account_replaces_previous() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = ccy(&conn, "USD");
    let first = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();

    let mut new = NewAccount::new(user, ccy(&conn, "EUR"));
    new.is_default = true;
    new.name = Some("Savings".into());
    let second = ledger::create_account(&mut conn, &new).unwrap();

    assert!(second.is_default);
    assert_eq!(second.name, "Savings");
    assert_eq!(defaults(&conn, user), vec![second.id]);
    assert!(!ledger::get_account(&conn, first.id).unwrap().unwrap().is_default);
}

#[test]
fn set_default_keeps_exactly_one() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = ccy(&conn, "USD");
    let a = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();
    let b = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();
    let c = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();

    ledger::set_default(&mut conn, user, c.id).unwrap();
    assert_eq!(defaults(&conn, user), vec![c.id]);
    ledger::set_default(&mut conn, user, b.id).unwrap();
    assert_eq!(defaults(&conn, user), vec![b.id]);
    assert!(!ledger::get_account(&conn, a.id).unwrap().unwrap().is_default);
}

#[test]
fn defaults_are_per_user() {
    let mut conn = setup();
    let alice = add_user(&conn, "alice@example.com");
    let bob = add_user(&conn, "bob@example.com");
    let usd = ccy(&conn, "USD");
    let a = ledger::create_account(&mut conn, &NewAccount::new(alice, usd)).unwrap();
    let b = ledger::create_account(&mut conn, &NewAccount::new(bob, usd)).unwrap();
    assert!(a.is_default && b.is_default);
}

#[test]
fn set_default_rejects_foreign_account() {
    let mut conn = setup();
    let alice = add_user(&conn, "alice@example.com");
    let bob = add_user(&conn, "bob@example.com");
    let usd = ccy(&conn, "USD");
    let mine = ledger::create_account(&mut conn, &NewAccount::new(alice, usd)).unwrap();
    let theirs = ledger::create_account(&mut conn, &NewAccount::new(bob, usd)).unwrap();

    let err = ledger::set_default(&mut conn, alice, theirs.id).unwrap_err();
    assert!(matches!(err, FinanceError::AccountOwnershipMismatch { .. }));
    assert_eq!(defaults(&conn, alice), vec![mine.id]);
    assert_eq!(defaults(&conn, bob), vec![theirs.id]);

    assert!(matches!(
        ledger::set_default(&mut conn, alice, 4242),
        Err(FinanceError::AccountNotFound(4242))
    ));
}

#[test]
fn resolve_default_without_accounts() {
    let conn = setup();
    let user = add_user(&conn, "a@example.com");
    assert!(matches!(
        ledger::resolve_account(&conn, user, AccountSelector::Default),
        Err(FinanceError::NoDefaultAccount(u)) if u == user
    ));
    assert_eq!(AccountSelector::from(None), AccountSelector::Default);
    assert_eq!(AccountSelector::from(Some(3)), AccountSelector::Explicit(3));
}

#[test]
fn adjust_balance_allows_overdraft() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let mut new = NewAccount::new(user, ccy(&conn, "USD"));
    new.initial_balance = Decimal::new(1000, 2);
    let acct = ledger::create_account(&mut conn, &new).unwrap();

    let b = ledger::adjust_balance(&conn, acct.id, Decimal::new(2500, 2), false).unwrap();
    assert_eq!(b, Decimal::new(-1500, 2));
    let b = ledger::adjust_balance(&conn, acct.id, Decimal::new(500, 2), true).unwrap();
    assert_eq!(b, Decimal::new(-1000, 2));
    assert_eq!(
        ledger::get_account(&conn, acct.id).unwrap().unwrap().balance,
        Decimal::new(-1000, 2)
    );
}

#[test]
fn unknown_currency_is_rejected() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    assert!(matches!(
        ledger::create_account(&mut conn, &NewAccount::new(user, 999)),
        Err(FinanceError::CurrencyNotFound(_))
    ));
}
