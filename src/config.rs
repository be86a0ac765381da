// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Duration;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

pub const DEFAULT_EXCHANGE_API_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const DEFAULT_PIVOT_CURRENCY: &str = "USD";
const DEV_JWT_SECRET: &str = "fintrack-dev-secret-change-me";

/// Settings for the exchange-rate resolver and its refresh loop.
#[derive(Debug, Clone)]
pub struct FxSettings {
    pub endpoint: String,
    pub pivot_code: String,
    pub staleness: Duration,
    pub refresh_interval: StdDuration,
    pub request_timeout: StdDuration,
}

impl Default for FxSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EXCHANGE_API_ENDPOINT.to_string(),
            pivot_code: DEFAULT_PIVOT_CURRENCY.to_string(),
            staleness: Duration::hours(24),
            refresh_interval: StdDuration::from_secs(12 * 60 * 60),
            request_timeout: StdDuration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub session_ttl: Duration,
}

impl AuthSettings {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl: Duration::days(7),
        }
    }
}

/// Process configuration, built once at startup and handed out by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub fx: FxSettings,
    pub auth: AuthSettings,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = match var("FINTRACK_DB_PATH") {
            Some(p) => PathBuf::from(p),
            None => crate::db::db_path()?,
        };

        let defaults = FxSettings::default();
        let stale_hours: i64 = parse_or(var("FINTRACK_RATE_STALE_HOURS"), "FINTRACK_RATE_STALE_HOURS", 24)?;
        let fx = FxSettings {
            endpoint: var("FINTRACK_EXCHANGE_API_ENDPOINT").unwrap_or(defaults.endpoint),
            pivot_code: var("FINTRACK_PIVOT_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or(defaults.pivot_code),
            staleness: Duration::try_hours(stale_hours)
                .filter(|d| *d >= Duration::zero())
                .with_context(|| {
                    format!("FINTRACK_RATE_STALE_HOURS out of range: {}", stale_hours)
                })?,
            refresh_interval: refresh_interval_hours(parse_or(
                var("FINTRACK_REFRESH_INTERVAL_HOURS"),
                "FINTRACK_REFRESH_INTERVAL_HOURS",
                12,
            )?)?,
            request_timeout: StdDuration::from_secs(parse_or(
                var("FINTRACK_PROVIDER_TIMEOUT_SECS"),
                "FINTRACK_PROVIDER_TIMEOUT_SECS",
                10,
            )?),
        };

        let ttl_days: i64 = parse_or(var("FINTRACK_SESSION_TTL_DAYS"), "FINTRACK_SESSION_TTL_DAYS", 7)?;
        let auth = AuthSettings {
            jwt_secret: var("FINTRACK_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            session_ttl: Duration::try_days(ttl_days)
                .filter(|d| *d > Duration::zero())
                .with_context(|| format!("FINTRACK_SESSION_TTL_DAYS out of range: {}", ttl_days))?,
        };

        let log_json = var("FINTRACK_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            db_path,
            fx,
            auth,
            log_json,
        })
    }
}

/// Refresh period for a whole number of hours; zero would spin the loop.
pub fn refresh_interval_hours(hours: u64) -> Result<StdDuration> {
    anyhow::ensure!(hours > 0, "refresh interval must be at least one hour");
    hours
        .checked_mul(60 * 60)
        .map(StdDuration::from_secs)
        .with_context(|| format!("refresh interval of {} hours is out of range", hours))
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("Invalid value '{}' for {}", v, key)),
        None => Ok(default),
    }
}
