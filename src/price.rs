// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cached BTC/USD rate: staleness gate plus a single fetch per refresh.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{NetworkRequestError, PersistenceError};
use crate::ledger::LedgerStore;
use crate::utils::http_client;

/// `MMM dd, yyyy HH:mm:ss`, followed by a zone name.
const UPDATED_FORMAT: &str = "%b %d, %Y %H:%M:%S";

#[derive(Debug, Deserialize)]
struct CurrentPriceResponse {
    time: Time,
    #[serde(rename = "bpi", alias = "price")]
    price: Price,
}

#[derive(Debug, Deserialize)]
struct Time {
    updated: String,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(rename = "USD")]
    usd: Currency,
}

#[derive(Debug, Deserialize)]
struct Currency {
    rate: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub rate: Decimal,
    pub updated: DateTime<Utc>,
}

/// Anything that can report the current BTC/USD price.
pub trait PriceSource {
    fn name(&self) -> &str;

    fn fetch_current(&self) -> Result<PriceQuote, NetworkRequestError>;
}

/// Blocking GET against a CoinDesk-style `currentprice.json` endpoint.
pub struct CoindeskSource {
    endpoint: String,
    timeout: Duration,
}

impl CoindeskSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.price_endpoint.clone(), settings.http_timeout())
    }
}

impl PriceSource for CoindeskSource {
    fn name(&self) -> &str {
        "coindesk"
    }

    fn fetch_current(&self) -> Result<PriceQuote, NetworkRequestError> {
        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|_| NetworkRequestError::InvalidEndpoint(self.endpoint.clone()))?;
        let client = http_client(self.timeout)
            .map_err(|e| NetworkRequestError::InvalidResponse(e.to_string()))?;
        debug!(endpoint = %url, "requesting current price");
        let resp = client
            .get(url)
            .send()
            .map_err(|e| NetworkRequestError::InvalidResponse(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkRequestError::BadStatusCode(status.as_u16()));
        }
        let body = resp
            .bytes()
            .map_err(|e| NetworkRequestError::InvalidResponse(e.to_string()))?;
        decode_quote(&body)
    }
}

pub fn decode_quote(body: &[u8]) -> Result<PriceQuote, NetworkRequestError> {
    let resp: CurrentPriceResponse = serde_json::from_slice(body)
        .map_err(|e| NetworkRequestError::DecodingFailed(e.to_string()))?;
    Ok(PriceQuote {
        rate: parse_rate(&resp.price.usd.rate)?,
        updated: parse_updated(&resp.time.updated)?,
    })
}

/// Rates arrive as text with thousands separators, e.g. `67,123.4567`.
pub fn parse_rate(s: &str) -> Result<Decimal, NetworkRequestError> {
    s.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|_| NetworkRequestError::DecodingFailed(format!("rate '{}'", s)))
}

/// Parses `Mar 18, 2024 12:34:56 UTC`. Only UTC/GMT zone names are accepted.
pub fn parse_updated(s: &str) -> Result<DateTime<Utc>, NetworkRequestError> {
    let bad = || NetworkRequestError::DecodingFailed(format!("updated '{}'", s));
    let (head, zone) = s.trim().rsplit_once(' ').ok_or_else(bad)?;
    if !matches!(zone, "UTC" | "GMT") {
        return Err(bad());
    }
    NaiveDateTime::parse_from_str(head, UPDATED_FORMAT)
        .map(|n| n.and_utc())
        .map_err(|_| bad())
}

/// True when nothing is cached or when at least `threshold_hours` whole
/// hours have passed since `last_update`.
pub fn should_refresh(
    last_update: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold_hours: i64,
) -> bool {
    match last_update {
        None => true,
        Some(at) => now.signed_duration_since(at).num_hours().max(0) >= threshold_hours,
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Updated(PriceQuote),
    Failed(NetworkRequestError),
}

/// One fetch. On any failure the cached rate is reset to unknown.
pub fn refresh(
    store: &LedgerStore<'_>,
    source: &dyn PriceSource,
) -> Result<RefreshOutcome, PersistenceError> {
    match source.fetch_current() {
        Ok(quote) => {
            store.update_rate(quote.rate, Some(quote.updated))?;
            info!(source = source.name(), rate = %quote.rate, updated = %quote.updated, "rate refreshed");
            Ok(RefreshOutcome::Updated(quote))
        }
        Err(e) => {
            warn!(source = source.name(), error = %e, "rate refresh failed");
            store.update_rate(Decimal::ZERO, None)?;
            Ok(RefreshOutcome::Failed(e))
        }
    }
}

/// Runs [`refresh`] only when the cached rate is stale.
pub fn refresh_if_stale(
    store: &LedgerStore<'_>,
    source: &dyn PriceSource,
    now: DateTime<Utc>,
    threshold_hours: i64,
) -> Result<Option<RefreshOutcome>, PersistenceError> {
    let wallet = store.get_wallet()?;
    if !should_refresh(wallet.last_update, now, threshold_hours) {
        debug!(last_update = ?wallet.last_update, "rate is fresh");
        return Ok(None);
    }
    refresh(store, source).map(Some)
}
