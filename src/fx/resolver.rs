// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::provider::RateProvider;
use super::rates;
use crate::config::FxSettings;
use crate::currencies;
use crate::error::{FinanceError, Result};
use crate::models::{Currency, ExchangeRate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Identity,
    Direct,
    Inverse,
    Pivot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRate {
    pub base_currency_id: i64,
    pub target_currency_id: i64,
    pub rate: Decimal,
    pub last_updated: DateTime<Utc>,
    pub source: RateSource,
}

/// Outcome of one refresh cycle. Codes the provider did not quote are
/// skipped rather than failing the cycle, and are listed in `missing`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub pivot: String,
    pub updated: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

pub struct RateResolver<'a> {
    pub(super) conn: &'a Connection,
    provider: &'a dyn RateProvider,
    pub(super) settings: &'a FxSettings,
}

impl<'a> RateResolver<'a> {
    pub fn new(
        conn: &'a Connection,
        provider: &'a dyn RateProvider,
        settings: &'a FxSettings,
    ) -> Self {
        Self {
            conn,
            provider,
            settings,
        }
    }

    pub fn is_stale(&self, last_updated: DateTime<Utc>) -> bool {
        Utc::now() - last_updated > self.settings.staleness
    }

    /// Rate for 1 `base` in `target`: direct, then inverse, then via the pivot.
    pub fn resolve(&self, base: i64, target: i64) -> Result<ResolvedRate> {
        if base == target {
            return Ok(ResolvedRate {
                base_currency_id: base,
                target_currency_id: target,
                rate: Decimal::ONE,
                last_updated: Utc::now(),
                source: RateSource::Identity,
            });
        }

        let mut direct = rates::find(self.conn, base, target)?;
        if direct.as_ref().is_none_or(|r| self.is_stale(r.last_updated)) {
            match self.refresh_all() {
                Ok(_) => {
                    if let Some(fresh) = rates::find(self.conn, base, target)? {
                        direct = Some(fresh);
                    }
                }
                Err(e) => {
                    warn!(base, target, error = %e, "exchange rate refresh failed");
                    if let Some(stale) = &direct {
                        return Ok(resolved(base, target, stale.rate, stale.last_updated, RateSource::Direct));
                    }
                }
            }
        }
        if let Some(r) = direct {
            return Ok(resolved(base, target, r.rate, r.last_updated, RateSource::Direct));
        }

        if let Some(reverse) = rates::find(self.conn, target, base)? {
            if let Some(rate) = invert(reverse.rate) {
                return Ok(resolved(base, target, rate, reverse.last_updated, RateSource::Inverse));
            }
        }

        if let Some(pivot) = currencies::by_code(self.conn, &self.settings.pivot_code)? {
            let to_pivot = self.leg(base, pivot.id)?;
            let from_pivot = self.leg(pivot.id, target)?;
            if let (Some((r1, t1)), Some((r2, t2))) = (to_pivot, from_pivot) {
                if let Some(rate) = r1.checked_mul(r2) {
                    // the older leg bounds how fresh the composite can be
                    return Ok(resolved(base, target, rate, t1.min(t2), RateSource::Pivot));
                }
                warn!(base, target, "pivot rate out of range");
            }
        }

        Err(FinanceError::RateUnavailable { base, target })
    }

    /// One leg of a pivot composition: stored rate, else inverse of the reverse.
    fn leg(&self, from: i64, to: i64) -> Result<Option<(Decimal, DateTime<Utc>)>> {
        if from == to {
            return Ok(Some((Decimal::ONE, Utc::now())));
        }
        if let Some(r) = rates::find(self.conn, from, to)? {
            if r.rate > Decimal::ZERO {
                return Ok(Some((r.rate, r.last_updated)));
            }
        }
        if let Some(r) = rates::find(self.conn, to, from)? {
            if let Some(rate) = invert(r.rate) {
                return Ok(Some((rate, r.last_updated)));
            }
        }
        Ok(None)
    }

    pub fn pivot_currency(&self) -> Result<Currency> {
        currencies::by_code(self.conn, &self.settings.pivot_code)?
            .ok_or_else(|| FinanceError::MissingBaseCurrency(self.settings.pivot_code.clone()))
    }

    /// Pull pivot->X quotes from the provider and upsert one row per currency.
    pub fn refresh_all(&self) -> Result<RefreshReport> {
        let all = currencies::list(self.conn)?;
        let pivot = all
            .iter()
            .find(|c| c.code == self.settings.pivot_code)
            .ok_or_else(|| FinanceError::MissingBaseCurrency(self.settings.pivot_code.clone()))?;

        let quote = self.provider.latest(&pivot.code)?;
        let now = Utc::now();
        let mut report = RefreshReport {
            pivot: pivot.code.clone(),
            ..RefreshReport::default()
        };

        for currency in all.iter().filter(|c| c.id != pivot.id) {
            let rate = match quote.rates.get(&currency.code) {
                Some(r) if *r > Decimal::ZERO => *r,
                Some(r) => {
                    warn!(code = %currency.code, rate = %r, "provider returned a non-positive rate");
                    report.missing.push(currency.code.clone());
                    continue;
                }
                None => {
                    warn!(code = %currency.code, "exchange rate not found in provider response");
                    report.missing.push(currency.code.clone());
                    continue;
                }
            };
            match rates::upsert(self.conn, pivot.id, currency.id, rate, now) {
                Ok(_) => report.updated.push(currency.code.clone()),
                Err(e) => {
                    warn!(code = %currency.code, error = %e, "failed to save exchange rate");
                    report.failed.push(currency.code.clone());
                }
            }
        }

        info!(
            pivot = %report.pivot,
            updated = report.updated.len(),
            missing = report.missing.len(),
            failed = report.failed.len(),
            "exchange rates refreshed"
        );
        Ok(report)
    }

    /// All stored rates, refreshing first when none exist or any is stale.
    pub fn all_rates(&self) -> Result<Vec<ExchangeRate>> {
        let stored = rates::list(self.conn)?;
        let needs_update =
            stored.is_empty() || stored.iter().any(|r| self.is_stale(r.last_updated));
        if !needs_update {
            return Ok(stored);
        }
        match self.refresh_all() {
            Ok(_) => rates::list(self.conn),
            Err(e) if !stored.is_empty() => {
                warn!(error = %e, "exchange rate refresh failed; serving stored rates");
                Ok(stored)
            }
            Err(e) => Err(e),
        }
    }

    /// Manually record a rate for (base, target).
    pub fn set_rate(&self, base: i64, target: i64, rate: Decimal) -> Result<ExchangeRate> {
        if base == target {
            return Err(FinanceError::Validation(
                "base and target currency must differ".into(),
            ));
        }
        if rate <= Decimal::ZERO {
            return Err(FinanceError::Validation(format!(
                "rate must be positive, got {}",
                rate
            )));
        }
        currencies::require(self.conn, base)?;
        currencies::require(self.conn, target)?;
        rates::upsert(self.conn, base, target, rate, Utc::now())
    }
}

fn resolved(
    base: i64,
    target: i64,
    rate: Decimal,
    last_updated: DateTime<Utc>,
    source: RateSource,
) -> ResolvedRate {
    ResolvedRate {
        base_currency_id: base,
        target_currency_id: target,
        rate,
        last_updated,
        source,
    }
}

fn invert(rate: Decimal) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }
    Decimal::ONE.checked_div(rate)
}
