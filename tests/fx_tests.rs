// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use fintrack::config::FxSettings;
use fintrack::currencies;
use fintrack::error::{FinanceError, Result};
use fintrack::fx::{RateProvider, RateQuote, RateResolver, RateSource, rates};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

fn setup() -> Connection {
    fintrack::db::open_in_memory().unwrap()
}

fn id(conn: &Connection, code: &str) -> i64 {
    currencies::require_code(conn, code).unwrap().id
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct FailingProvider;

impl RateProvider for FailingProvider {
    fn latest(&self, _base: &str) -> Result<RateQuote> {
        Err(FinanceError::ProviderError("offline".into()))
    }
}

struct FixedProvider(HashMap<String, Decimal>);

impl FixedProvider {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self(pairs.iter().map(|(c, r)| (c.to_string(), dec(r))).collect())
    }
}

impl RateProvider for FixedProvider {
    fn latest(&self, base: &str) -> Result<RateQuote> {
        Ok(RateQuote {
            base: base.to_string(),
            rates: self.0.clone(),
        })
    }
}

#[test]
fn same_currency_is_identity() {
    let conn = setup();
    let settings = FxSettings::default();
    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let eur = id(&conn, "EUR");
    let r = resolver.resolve(eur, eur).unwrap();
    assert_eq!(r.rate, Decimal::ONE);
    assert_eq!(r.source, RateSource::Identity);
}

#[test]
fn fresh_direct_rate_skips_provider() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur) = (id(&conn, "USD"), id(&conn, "EUR"));
    rates::upsert(&conn, usd, eur, dec("0.9"), Utc::now()).unwrap();

    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let r = resolver.resolve(usd, eur).unwrap();
    assert_eq!(r.rate, dec("0.9"));
    assert_eq!(r.source, RateSource::Direct);
}

#[test]
fn inverse_rate_is_reciprocal() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur) = (id(&conn, "USD"), id(&conn, "EUR"));
    rates::upsert(&conn, usd, eur, dec("0.8"), Utc::now()).unwrap();

    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let r = resolver.resolve(eur, usd).unwrap();
    assert_eq!(r.source, RateSource::Inverse);
    assert_eq!(r.rate, dec("1.25"));

    let forward = resolver.resolve(usd, eur).unwrap();
    let product = forward.rate * r.rate;
    assert!((product - Decimal::ONE).abs() < dec("0.0000001"));
}

#[test]
fn cross_rate_goes_through_pivot() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur, jpy) = (id(&conn, "USD"), id(&conn, "EUR"), id(&conn, "JPY"));
    let older = Utc::now() - Duration::hours(2);
    rates::upsert(&conn, usd, eur, dec("0.9"), older).unwrap();
    rates::upsert(&conn, usd, jpy, dec("150"), Utc::now()).unwrap();

    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let r = resolver.resolve(eur, jpy).unwrap();
    assert_eq!(r.source, RateSource::Pivot);
    assert_eq!(format!("{:.2}", r.rate.round_dp(2)), "166.67");
    // composite is only as fresh as its older leg
    assert_eq!(r.last_updated, older);
}

#[test]
fn stale_rate_is_refreshed_from_provider() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur) = (id(&conn, "USD"), id(&conn, "EUR"));
    rates::upsert(&conn, usd, eur, dec("0.5"), Utc::now() - Duration::hours(30)).unwrap();

    let provider = FixedProvider::new(&[("EUR", "0.92"), ("GBP", "0.79")]);
    let resolver = RateResolver::new(&conn, &provider, &settings);
    let r = resolver.resolve(usd, eur).unwrap();
    assert_eq!(r.rate, dec("0.92"));
    assert!(!resolver.is_stale(r.last_updated));
}

#[test]
fn stale_rate_served_when_provider_fails() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur) = (id(&conn, "USD"), id(&conn, "EUR"));
    rates::upsert(&conn, usd, eur, dec("0.5"), Utc::now() - Duration::hours(30)).unwrap();

    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let r = resolver.resolve(usd, eur).unwrap();
    assert_eq!(r.rate, dec("0.5"));
    assert!(resolver.is_stale(r.last_updated));
}

#[test]
fn unknown_pair_is_unavailable() {
    let conn = setup();
    let settings = FxSettings::default();
    let (eur, gbp) = (id(&conn, "EUR"), id(&conn, "GBP"));
    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    assert!(matches!(
        resolver.resolve(eur, gbp),
        Err(FinanceError::RateUnavailable { .. })
    ));
}

#[test]
fn refresh_upserts_and_reports_missing_codes() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, eur) = (id(&conn, "USD"), id(&conn, "EUR"));
    rates::upsert(&conn, usd, eur, dec("0.5"), Utc::now() - Duration::days(3)).unwrap();

    let provider = FixedProvider::new(&[
        ("EUR", "0.92"),
        ("GBP", "0.79"),
        ("JPY", "150"),
        ("CNY", "7.2"),
        ("CHF", "0.88"),
    ]);
    let resolver = RateResolver::new(&conn, &provider, &settings);
    let report = resolver.refresh_all().unwrap();
    assert_eq!(report.pivot, "USD");
    assert_eq!(report.updated.len(), 5);
    assert_eq!(report.missing, vec!["RUB".to_string()]);

    // still one row per pair after the upsert
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM exchange_rates WHERE base_currency_id=?1 AND target_currency_id=?2",
            params![usd, eur],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(rates::find(&conn, usd, eur).unwrap().unwrap().rate, dec("0.92"));
}

#[test]
fn refresh_without_pivot_currency_fails() {
    let conn = setup();
    let settings = FxSettings {
        pivot_code: "XAU".into(),
        ..FxSettings::default()
    };
    let provider = FixedProvider::new(&[("EUR", "0.92")]);
    let resolver = RateResolver::new(&conn, &provider, &settings);
    assert!(matches!(
        resolver.refresh_all(),
        Err(FinanceError::MissingBaseCurrency(code)) if code == "XAU"
    ));
}

#[test]
fn refresh_propagates_provider_error() {
    let conn = setup();
    let settings = FxSettings::default();
    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    assert!(matches!(
        resolver.refresh_all(),
        Err(FinanceError::ProviderError(_))
    ));
    assert!(rates::list(&conn).unwrap().is_empty());
}

#[test]
fn convert_multiplies_by_resolved_rate() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, gbp) = (id(&conn, "USD"), id(&conn, "GBP"));
    rates::upsert(&conn, usd, gbp, dec("0.8"), Utc::now()).unwrap();

    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    let c = resolver.convert(dec("50"), gbp, usd).unwrap();
    assert_eq!(c.from_currency, "GBP");
    assert_eq!(c.to_currency, "USD");
    assert_eq!(c.converted_amount, dec("62.5"));

    assert!(matches!(
        resolver.convert(Decimal::MAX, gbp, usd),
        Err(FinanceError::Validation(_))
    ));
    assert!(matches!(
        resolver.convert(Decimal::ZERO, gbp, usd),
        Err(FinanceError::Validation(_))
    ));
    assert!(matches!(
        resolver.convert(dec("1"), gbp, 9999),
        Err(FinanceError::CurrencyNotFound(_))
    ));
}

#[test]
fn manual_rate_must_be_positive() {
    let conn = setup();
    let settings = FxSettings::default();
    let (usd, chf) = (id(&conn, "USD"), id(&conn, "CHF"));
    let resolver = RateResolver::new(&conn, &FailingProvider, &settings);
    assert!(resolver.set_rate(usd, chf, dec("-1")).is_err());
    assert!(resolver.set_rate(usd, usd, dec("1")).is_err());
    let r = resolver.set_rate(usd, chf, dec("0.88")).unwrap();
    assert_eq!(r.rate, dec("0.88"));
}
