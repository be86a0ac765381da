// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::FxSettings;
use crate::error::{FinanceError, Result};
use crate::utils::http_client;

/// Latest quotes for one base currency: 1 base = rate code.
#[derive(Debug, Clone, Default)]
pub struct RateQuote {
    pub base: String,
    pub rates: HashMap<String, Decimal>,
}

/// Source of fresh exchange rates.
pub trait RateProvider: Send + Sync {
    fn latest(&self, base: &str) -> Result<RateQuote>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: String,
    rates: HashMap<String, f64>,
}

/// Fetches `{"base": .., "rates": {..}}` from a single HTTP endpoint.
///
/// A `{base}` placeholder in the endpoint is replaced with the requested
/// base code; otherwise the endpoint is used verbatim.
pub struct HttpRateProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpRateProvider {
    pub fn new(settings: &FxSettings) -> Result<Self> {
        let client = http_client(settings.request_timeout)
            .map_err(|e| FinanceError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }
}

impl RateProvider for HttpRateProvider {
    fn latest(&self, base: &str) -> Result<RateQuote> {
        let url = self.endpoint.replace("{base}", base);
        tracing::debug!(%url, "fetching exchange rates");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FinanceError::ProviderError(format!("failed to fetch rates: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FinanceError::ProviderError(format!(
                "rate API returned status {}",
                status
            )));
        }
        let body: LatestResponse = resp
            .json()
            .map_err(|e| FinanceError::ProviderError(format!("failed to parse rates: {}", e)))?;
        if !body.base.eq_ignore_ascii_case(base) {
            return Err(FinanceError::ProviderError(format!(
                "rate API answered for base '{}', expected '{}'",
                body.base, base
            )));
        }

        let mut rates = HashMap::with_capacity(body.rates.len());
        for (code, rate) in body.rates {
            match Decimal::try_from(rate) {
                Ok(d) => {
                    rates.insert(code.to_uppercase(), d);
                }
                Err(_) => tracing::warn!(%code, rate, "ignoring unrepresentable rate"),
            }
        }
        Ok(RateQuote {
            base: body.base.to_uppercase(),
            rates,
        })
    }
}
