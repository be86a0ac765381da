// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Background refresh of exchange rates on a fixed interval.
//!
//! The loop runs on its own thread with its own connection. A failed cycle
//! is logged and the loop keeps going; only [`RefreshScheduler::stop`] (or
//! dropping the handle) ends it.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::provider::RateProvider;
use super::resolver::RateResolver;
use crate::config::FxSettings;
use crate::db;

pub struct RefreshScheduler {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    cycles: Arc<AtomicU64>,
}

impl RefreshScheduler {
    /// Refresh once immediately, then every `settings.refresh_interval`.
    /// A zero interval is rejected.
    pub fn spawn(
        db_path: PathBuf,
        settings: FxSettings,
        provider: Arc<dyn RateProvider>,
    ) -> std::io::Result<Self> {
        if settings.refresh_interval.is_zero() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "refresh interval must be non-zero",
            ));
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let cycles = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&cycles);

        let handle = thread::Builder::new()
            .name("fx-refresh".into())
            .spawn(move || {
                let conn = match db::open_or_init(&db_path) {
                    Ok(c) => c,
                    Err(e) => {
                        error!(error = %e, "fx scheduler could not open the database");
                        return;
                    }
                };
                let resolver = RateResolver::new(&conn, provider.as_ref(), &settings);
                loop {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    match resolver.refresh_all() {
                        Ok(report) => info!(cycle = n, updated = report.updated.len(), "scheduled exchange rate update done"),
                        Err(e) => warn!(cycle = n, error = %e, "scheduled exchange rate update failed"),
                    }
                    match stop_rx.recv_timeout(settings.refresh_interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("fx scheduler stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            cycles,
        })
    }

    /// Number of refresh cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Block until the refresh thread exits.
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
