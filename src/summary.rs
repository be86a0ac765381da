// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only aggregations over a user's transactions.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

use crate::categories;
use crate::error::{FinanceError, Result};
use crate::models::{
    CategorySummary, Dashboard, MonthlySummary, Transaction, TransactionKind, TransactionSummary,
};
use crate::transactions;
use crate::utils::month_bounds;

const DASHBOARD_RECENT: usize = 10;

fn add(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_add(amount).ok_or_else(FinanceError::out_of_range)
}

fn summarize(txs: &[Transaction], start: NaiveDate, end: NaiveDate) -> Result<TransactionSummary> {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for t in txs {
        match t.kind {
            TransactionKind::Income => income = add(income, t.amount)?,
            TransactionKind::Expense => expense = add(expense, t.amount)?,
        }
    }
    Ok(TransactionSummary {
        total_income: income,
        total_expense: expense,
        net_amount: income
            .checked_sub(expense)
            .ok_or_else(FinanceError::out_of_range)?,
        transaction_count: txs.len(),
        period_start: start.format("%Y-%m-%d").to_string(),
        period_end: end.format("%Y-%m-%d").to_string(),
    })
}

/// Totals for transactions dated within `[start, end]` inclusive.
pub fn summary(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TransactionSummary> {
    let txs = transactions::list_for_period(conn, user_id, start, end)?;
    summarize(&txs, start, end)
}

/// Same as [`summary`], restricted to the default account. A user without
/// one gets an all-zero summary.
pub fn summary_for_default_account(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TransactionSummary> {
    let txs = transactions::list_for_default_account_period(conn, user_id, start, end)?;
    summarize(&txs, start, end)
}

pub fn by_category(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CategorySummary>> {
    let txs = transactions::list_for_period(conn, user_id, start, end)?;

    let mut groups: HashMap<i64, CategorySummary> = categories::list_for_user(conn, user_id)?
        .into_iter()
        .map(|c| {
            (
                c.id,
                CategorySummary {
                    category_id: c.id,
                    category_name: c.name,
                    kind: c.kind,
                    total_amount: Decimal::ZERO,
                    count: 0,
                    percentage: Decimal::ZERO,
                },
            )
        })
        .collect();

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for t in &txs {
        if !groups.contains_key(&t.category_id) {
            // not in the preload (e.g. another user's category); look it up once
            let Some(c) = categories::get(conn, t.category_id)? else {
                warn!(transaction = t.id, category = t.category_id, "transaction references an unknown category");
                continue;
            };
            groups.insert(
                c.id,
                CategorySummary {
                    category_id: c.id,
                    category_name: c.name,
                    kind: c.kind,
                    total_amount: Decimal::ZERO,
                    count: 0,
                    percentage: Decimal::ZERO,
                },
            );
        }
        if let Some(group) = groups.get_mut(&t.category_id) {
            group.total_amount = add(group.total_amount, t.amount)?;
            group.count += 1;
        }
        match t.kind {
            TransactionKind::Income => income = add(income, t.amount)?,
            TransactionKind::Expense => expense = add(expense, t.amount)?,
        }
    }

    let mut out: Vec<CategorySummary> = groups
        .into_values()
        .map(|mut s| {
            let total = match s.kind {
                TransactionKind::Income => income,
                TransactionKind::Expense => expense,
            };
            if total > Decimal::ZERO {
                // a share of its own type total, so at most 100
                s.percentage = s
                    .total_amount
                    .checked_div(total)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .unwrap_or(Decimal::ZERO);
            }
            s
        })
        .collect();
    out.sort_by(|a, b| {
        a.kind
            .as_str()
            .cmp(b.kind.as_str())
            .then_with(|| b.total_amount.cmp(&a.total_amount))
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    Ok(out)
}

/// One entry per calendar month of `year`, January first.
///
/// Best effort: a month whose summary fails is logged and left out rather
/// than failing the whole year.
pub fn monthly(conn: &Connection, user_id: i64, year: i32) -> Result<Vec<MonthlySummary>> {
    let mut out = Vec::with_capacity(12);
    for month in 1..=12u32 {
        let Some((start, end)) = month_bounds(year, month) else {
            warn!(year, month, "month out of range; skipped");
            continue;
        };
        match summary(conn, user_id, start, end) {
            Ok(s) => out.push(MonthlySummary {
                month: start.format("%Y-%m").to_string(),
                total_income: s.total_income,
                total_expense: s.total_expense,
                net_amount: s.net_amount,
            }),
            Err(e) => warn!(year, month, error = %e, "monthly summary failed; month skipped"),
        }
    }
    Ok(out)
}

pub fn dashboard(
    conn: &Connection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Dashboard> {
    let txs = transactions::list_for_period(conn, user_id, start, end)?;
    let summary = summarize(&txs, start, end)?;
    let by_category = by_category(conn, user_id, start, end)?;
    let recent_transactions = txs.into_iter().take(DASHBOARD_RECENT).collect();
    Ok(Dashboard {
        summary,
        by_category,
        recent_transactions,
    })
}
