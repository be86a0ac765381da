// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod currencies;
pub mod doctor;
pub mod fx;
pub mod reports;
pub mod transactions;
pub mod users;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::Config;
use crate::error::FinanceError;
use crate::fx::{HttpRateProvider, RateProvider, RateResolver};
use crate::models::User;
use crate::utils::{month_bounds, parse_date, parse_month};

/// Long-lived services shared by every command.
pub struct App {
    pub config: Config,
    pub auth: AuthManager,
    pub provider: Arc<dyn RateProvider>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let auth = AuthManager::new(&config.auth)?;
        let provider: Arc<dyn RateProvider> = Arc::new(HttpRateProvider::new(&config.fx)?);
        Ok(Self {
            config,
            auth,
            provider,
        })
    }

    pub fn with_provider(config: Config, provider: Arc<dyn RateProvider>) -> Result<Self> {
        let auth = AuthManager::new(&config.auth)?;
        Ok(Self {
            config,
            auth,
            provider,
        })
    }

    pub fn resolver<'a>(&'a self, conn: &'a Connection) -> RateResolver<'a> {
        RateResolver::new(conn, self.provider.as_ref(), &self.config.fx)
    }

    /// The user behind `--token`.
    pub fn authenticate(&self, conn: &Connection, m: &clap::ArgMatches) -> Result<User> {
        let token = m
            .get_one::<String>("token")
            .ok_or(FinanceError::InvalidOrExpiredToken)
            .context("Log in first and pass --token (or set FINTRACK_TOKEN)")?;
        Ok(self.auth.validate(conn, token)?)
    }
}

/// A required argument; clap enforces presence, this only avoids panicking.
pub(crate) fn arg<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing argument '{}'", id))
}

pub(crate) fn id_arg(m: &clap::ArgMatches, id: &str) -> Result<i64> {
    m.get_one::<i64>(id)
        .copied()
        .with_context(|| format!("Missing argument '{}'", id))
}

/// Period from `--month` or `--from/--to`; defaults to month-to-date.
pub fn period(m: &clap::ArgMatches) -> Result<(NaiveDate, NaiveDate)> {
    if let Some(month) = m.get_one::<String>("month") {
        let (y, mo) = parse_month(month)?;
        return month_bounds(y, mo).with_context(|| format!("Invalid month '{}'", month));
    }
    let today = Utc::now().date_naive();
    let start = match m.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => today.with_day(1).unwrap_or(today),
    };
    let end = match m.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => today,
    };
    Ok((start, end))
}
