// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, Utc};
use fintrack::categories::{self, NewCategory};
use fintrack::currencies;
use fintrack::error::FinanceError;
use fintrack::ledger::{self, AccountSelector, NewAccount};
use fintrack::models::TransactionKind;
use fintrack::transactions::{self, NewTransaction};
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

fn category(conn: &Connection, name: &str) -> i64 {
    conn.query_row(
        "SELECT id FROM categories WHERE name=?1 AND user_id IS NULL",
        params![name],
        |r| r.get(0),
    )
    .unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn new_tx(user: i64, category_id: i64, kind: TransactionKind, amount: i64) -> NewTransaction {
    NewTransaction {
        user_id: user,
        category_id,
        account: AccountSelector::Default,
        amount: Decimal::new(amount, 0),
        description: "test".into(),
        date: date("2025-03-15"),
        kind,
    }
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn income_and_expense_move_default_balance() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    let acct = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();

    let salary = category(&conn, "Salary");
    let food = category(&conn, "Food");
    let t = transactions::create_transaction(
        &mut conn,
        &new_tx(user, salary, TransactionKind::Income, 100),
    )
    .unwrap();
    assert_eq!(t.account_id, acct.id);
    transactions::create_transaction(&mut conn, &new_tx(user, food, TransactionKind::Expense, 30))
        .unwrap();

    let balance = ledger::get_account(&conn, acct.id).unwrap().unwrap().balance;
    assert_eq!(balance, Decimal::new(70, 0));
    assert_eq!(tx_count(&conn), 2);
}

#[test]
fn type_mismatch_has_no_side_effects() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    let acct = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();

    let food = category(&conn, "Food");
    let err = transactions::create_transaction(
        &mut conn,
        &new_tx(user, food, TransactionKind::Income, 50),
    )
    .unwrap_err();
    assert!(matches!(err, FinanceError::CategoryTypeMismatch { .. }));
    assert_eq!(tx_count(&conn), 0);
    assert_eq!(
        ledger::get_account(&conn, acct.id).unwrap().unwrap().balance,
        Decimal::ZERO
    );
}

#[test]
fn missing_default_account_is_reported() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let salary = category(&conn, "Salary");
    let err = transactions::create_transaction(
        &mut conn,
        &new_tx(user, salary, TransactionKind::Income, 10),
    )
    .unwrap_err();
    assert!(matches!(err, FinanceError::NoDefaultAccount(_)));
    assert_eq!(tx_count(&conn), 0);
}

#[test]
fn non_positive_amount_is_rejected() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let salary = category(&conn, "Salary");
    let err = transactions::create_transaction(
        &mut conn,
        &new_tx(user, salary, TransactionKind::Income, 0),
    )
    .unwrap_err();
    assert!(matches!(err, FinanceError::Validation(_)));
}

#[test]
fn explicit_account_must_be_owned() {
    let mut conn = setup();
    let alice = add_user(&conn, "alice@example.com");
    let bob = add_user(&conn, "bob@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    ledger::create_account(&mut conn, &NewAccount::new(alice, usd)).unwrap();
    let bobs = ledger::create_account(&mut conn, &NewAccount::new(bob, usd)).unwrap();

    let mut new = new_tx(alice, category(&conn, "Salary"), TransactionKind::Income, 10);
    new.account = AccountSelector::Explicit(bobs.id);
    let err = transactions::create_transaction(&mut conn, &new).unwrap_err();
    assert!(matches!(err, FinanceError::AccountOwnershipMismatch { .. }));
    assert_eq!(
        ledger::get_account(&conn, bobs.id).unwrap().unwrap().balance,
        Decimal::ZERO
    );
}

#[test]
fn other_users_category_is_not_found() {
    let mut conn = setup();
    let alice = add_user(&conn, "alice@example.com");
    let bob = add_user(&conn, "bob@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    ledger::create_account(&mut conn, &NewAccount::new(alice, usd)).unwrap();
    let bobs_cat = categories::create(
        &conn,
        &NewCategory {
            user_id: Some(bob),
            name: "Side gig".into(),
            description: String::new(),
            kind: TransactionKind::Income,
        },
    )
    .unwrap();

    let err = transactions::create_transaction(
        &mut conn,
        &new_tx(alice, bobs_cat.id, TransactionKind::Income, 10),
    )
    .unwrap_err();
    assert!(matches!(err, FinanceError::CategoryNotFound(id) if id == bobs_cat.id));

    let names: Vec<String> = categories::list_for_user(&conn, alice)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Salary".to_string()));
    assert!(!names.contains(&"Side gig".to_string()));
}

#[test]
fn listings_are_scoped_and_ordered() {
    let mut conn = setup();
    let alice = add_user(&conn, "alice@example.com");
    let bob = add_user(&conn, "bob@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    ledger::create_account(&mut conn, &NewAccount::new(alice, usd)).unwrap();
    ledger::create_account(&mut conn, &NewAccount::new(bob, usd)).unwrap();
    let salary = category(&conn, "Salary");

    for d in ["2025-01-31", "2025-02-01", "2025-02-28", "2025-03-01"] {
        let mut new = new_tx(alice, salary, TransactionKind::Income, 5);
        new.date = date(d);
        transactions::create_transaction(&mut conn, &new).unwrap();
    }
    let bobs = transactions::create_transaction(
        &mut conn,
        &new_tx(bob, salary, TransactionKind::Income, 5),
    )
    .unwrap();

    let all = transactions::list_for_user(&conn, alice).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].date, date("2025-03-01"));

    let feb = transactions::list_for_period(&conn, alice, date("2025-02-01"), date("2025-02-28"))
        .unwrap();
    assert_eq!(feb.len(), 2);

    assert_eq!(transactions::recent(&conn, alice, 3).unwrap().len(), 3);
    assert_eq!(transactions::list_for_default_account(&conn, alice).unwrap().len(), 4);
    assert!(matches!(
        transactions::get_for_user(&conn, alice, bobs.id),
        Err(FinanceError::TransactionNotFound(_))
    ));
    assert!(
        transactions::list_for_period(&conn, alice, date("2025-03-01"), date("2025-02-01"))
            .is_err()
    );
}

#[test]
fn balance_overflow_is_rejected_and_rolled_back() {
    let mut conn = setup();
    let user = add_user(&conn, "a@example.com");
    let usd = currencies::require_code(&conn, "USD").unwrap().id;
    let acct = ledger::create_account(&mut conn, &NewAccount::new(user, usd)).unwrap();
    let salary = category(&conn, "Salary");

    let mut big = new_tx(user, salary, TransactionKind::Income, 1);
    big.amount = Decimal::MAX;
    transactions::create_transaction(&mut conn, &big).unwrap();

    let err = transactions::create_transaction(&mut conn, &big).unwrap_err();
    assert!(matches!(err, FinanceError::Validation(_)));
    assert_eq!(tx_count(&conn), 1);
    assert_eq!(
        ledger::get_account(&conn, acct.id).unwrap().unwrap().balance,
        Decimal::MAX
    );
}
