// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::config::FxSettings;
use fintrack::error::{FinanceError, Result};
use fintrack::fx::{RateProvider, RateQuote, RefreshScheduler, rates};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

struct CountingProvider {
    calls: AtomicUsize,
    fail_first: bool,
}

impl RateProvider for CountingProvider {
    fn latest(&self, base: &str) -> Result<RateQuote> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && n == 0 {
            return Err(FinanceError::ProviderError("first call fails".into()));
        }
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), Decimal::new(92, 2));
        Ok(RateQuote {
            base: base.to_string(),
            rates,
        })
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn scheduler_keeps_running_after_a_failed_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fx.sqlite");
    let settings = FxSettings {
        refresh_interval: Duration::from_millis(20),
        ..FxSettings::default()
    };
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
        fail_first: true,
    });

    let scheduler =
        RefreshScheduler::spawn(path.clone(), settings, provider.clone()).unwrap();
    assert!(wait_for(|| provider.calls.load(Ordering::SeqCst) >= 3));
    assert!(scheduler.cycles() >= 3);
    scheduler.stop();

    let conn = fintrack::db::open_or_init(&path).unwrap();
    let stored = rates::list(&conn).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].rate, Decimal::new(92, 2));
}

#[test]
fn stop_ends_the_loop_before_the_next_interval() {
    let dir = tempfile::tempdir().unwrap();
    let settings = FxSettings {
        refresh_interval: Duration::from_secs(3600),
        ..FxSettings::default()
    };
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
        fail_first: false,
    });

    let started = Instant::now();
    let scheduler =
        RefreshScheduler::spawn(dir.path().join("fx.sqlite"), settings, provider.clone())
            .unwrap();
    assert!(wait_for(|| provider.calls.load(Ordering::SeqCst) >= 1));
    scheduler.stop();
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let settings = FxSettings {
        refresh_interval: Duration::ZERO,
        ..FxSettings::default()
    };
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
        fail_first: false,
    });
    let res = RefreshScheduler::spawn(dir.path().join("fx.sqlite"), settings, provider.clone());
    assert!(res.is_err());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
