// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::resolver::{RateResolver, RateSource};
use crate::currencies;
use crate::error::{FinanceError, Result};
use crate::ledger;
use crate::models::AccountBalance;

#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub converted_amount: Decimal,
    pub last_updated: DateTime<Utc>,
    pub source: RateSource,
}

impl RateResolver<'_> {
    /// Convert `amount` of one currency into another.
    pub fn convert(&self, amount: Decimal, from: i64, to: i64) -> Result<Conversion> {
        if amount <= Decimal::ZERO {
            return Err(FinanceError::Validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        let from_ccy = currencies::require(self.conn, from)?;
        let to_ccy = currencies::require(self.conn, to)?;
        let rate = self.resolve(from_ccy.id, to_ccy.id)?;
        let converted_amount = amount
            .checked_mul(rate.rate)
            .ok_or_else(FinanceError::out_of_range)?;
        Ok(Conversion {
            from_currency: from_ccy.code,
            to_currency: to_ccy.code,
            amount,
            rate: rate.rate,
            converted_amount,
            last_updated: rate.last_updated,
            source: rate.source,
        })
    }

    /// Convert between two accounts, both of which must belong to `user_id`.
    pub fn convert_between_accounts(
        &self,
        user_id: i64,
        from_account: i64,
        to_account: i64,
        amount: Decimal,
    ) -> Result<Conversion> {
        let from = ledger::owned_account(self.conn, user_id, from_account)?;
        let to = ledger::owned_account(self.conn, user_id, to_account)?;
        self.convert(amount, from.currency_id, to.currency_id)
    }

    /// Every account of the user with its balance expressed in the pivot currency.
    pub fn balances_in_pivot(&self, user_id: i64) -> Result<Vec<AccountBalance>> {
        let pivot = self.pivot_currency()?;
        let accounts = ledger::list_accounts(self.conn, user_id)?;
        let mut out = Vec::with_capacity(accounts.len());
        for account in accounts {
            let currency = currencies::require(self.conn, account.currency_id)?;
            let in_pivot = match self.resolve(account.currency_id, pivot.id) {
                Ok(r) => {
                    let converted = account.balance.checked_mul(r.rate);
                    if converted.is_none() {
                        warn!(account = account.id, "balance in pivot currency out of range");
                    }
                    converted
                }
                Err(e) => {
                    warn!(account = account.id, error = %e, "could not convert balance to pivot currency");
                    None
                }
            };
            out.push(AccountBalance {
                account_id: account.id,
                account_name: account.name,
                currency_code: currency.code,
                balance: account.balance,
                balance_in_pivot: in_pivot,
            });
        }
        Ok(out)
    }
}
