// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use btcledger::{
    db,
    error::NetworkRequestError,
    ledger::LedgerStore,
    price::{refresh, refresh_if_stale, CoindeskSource, PriceQuote, PriceSource, RefreshOutcome},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::time::Duration as Timeout;
use rust_decimal::Decimal;

/// Scripted source; counts how often it was asked.
struct FakeSource<F: Fn() -> Result<PriceQuote, NetworkRequestError>> {
    respond: F,
    calls: Cell<usize>,
}

impl<F: Fn() -> Result<PriceQuote, NetworkRequestError>> FakeSource<F> {
    fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Cell::new(0),
        }
    }
}

impl<F: Fn() -> Result<PriceQuote, NetworkRequestError>> PriceSource for FakeSource<F> {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_current(&self) -> Result<PriceQuote, NetworkRequestError> {
        self.calls.set(self.calls.get() + 1);
        (self.respond)()
    }
}

/// Serves `response` to a single connection and returns the endpoint URL.
fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }
        reader.get_mut().write_all(response.as_bytes()).unwrap();
    });
    format!("http://{addr}/v1/bpi/currentprice.json")
}

fn quote_at(at: DateTime<Utc>) -> PriceQuote {
    PriceQuote {
        rate: "67123.4567".parse().unwrap(),
        updated: at,
    }
}

#[test]
fn server_error_erases_cached_rate() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let earlier = Utc.with_ymd_and_hms(2024, 3, 18, 9, 0, 0).unwrap();
    store
        .update_rate("65000".parse().unwrap(), Some(earlier))
        .unwrap();

    let source = FakeSource::new(|| Err(NetworkRequestError::BadStatusCode(500)));
    let outcome = refresh(&store, &source).unwrap();

    assert!(matches!(
        outcome,
        RefreshOutcome::Failed(NetworkRequestError::BadStatusCode(500))
    ));
    let w = store.get_wallet().unwrap();
    assert_eq!(w.rate, Decimal::ZERO);
    assert!(w.last_update.is_none());
}

#[test]
fn success_stores_rate_and_time() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let at = Utc.with_ymd_and_hms(2024, 3, 18, 12, 34, 56).unwrap();
    let source = FakeSource::new(|| Ok(quote_at(at)));

    let outcome = refresh(&store, &source).unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated(_)));
    let w = store.get_wallet().unwrap();
    assert_eq!(w.rate, "67123.4567".parse::<Decimal>().unwrap());
    assert_eq!(w.last_update, Some(at));
}

#[test]
fn fresh_rate_is_not_fetched() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let now = Utc.with_ymd_and_hms(2024, 3, 18, 12, 0, 0).unwrap();
    store
        .update_rate("65000".parse().unwrap(), Some(now - Duration::minutes(30)))
        .unwrap();

    let source = FakeSource::new(|| Ok(quote_at(now)));
    assert!(refresh_if_stale(&store, &source, now, 1).unwrap().is_none());
    assert_eq!(source.calls.get(), 0);
    assert_eq!(
        store.get_wallet().unwrap().rate,
        "65000".parse::<Decimal>().unwrap()
    );
}

#[test]
fn stale_or_missing_rate_is_fetched_once() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let now = Utc.with_ymd_and_hms(2024, 3, 18, 12, 0, 0).unwrap();
    let source = FakeSource::new(|| Ok(quote_at(now)));

    // never fetched
    assert!(refresh_if_stale(&store, &source, now, 1).unwrap().is_some());
    assert_eq!(source.calls.get(), 1);

    store
        .update_rate("65000".parse().unwrap(), Some(now - Duration::minutes(61)))
        .unwrap();
    assert!(refresh_if_stale(&store, &source, now, 1).unwrap().is_some());
    assert_eq!(source.calls.get(), 2);
    assert_eq!(store.get_wallet().unwrap().last_update, Some(now));
}

#[test]
fn failed_refresh_makes_next_check_stale() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let now = Utc.with_ymd_and_hms(2024, 3, 18, 12, 0, 0).unwrap();
    let failing = FakeSource::new(|| {
        Err(NetworkRequestError::DecodingFailed("rate 'n/a'".into()))
    });
    refresh(&store, &failing).unwrap();

    let ok = FakeSource::new(|| Ok(quote_at(now)));
    assert!(refresh_if_stale(&store, &ok, now, 1).unwrap().is_some());
}

#[test]
fn http_500_from_endpoint_erases_cached_rate() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let earlier = Utc.with_ymd_and_hms(2024, 3, 18, 9, 0, 0).unwrap();
    store
        .update_rate("65000".parse().unwrap(), Some(earlier))
        .unwrap();

    let endpoint = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
    let source = CoindeskSource::new(endpoint, Timeout::from_secs(5));
    let outcome = refresh(&store, &source).unwrap();

    assert!(matches!(
        outcome,
        RefreshOutcome::Failed(NetworkRequestError::BadStatusCode(500))
    ));
    let w = store.get_wallet().unwrap();
    assert_eq!(w.rate, Decimal::ZERO);
    assert!(w.last_update.is_none());
}

#[test]
fn endpoint_body_is_decoded_into_wallet() {
    let conn = db::open_in_memory().unwrap();
    let store = LedgerStore::new(&conn);
    let endpoint = serve_once(concat!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 85\r\nConnection: close\r\n\r\n",
        r#"{"time":{"updated":"Mar 18, 2024 12:34:56 UTC"},"bpi":{"USD":{"rate":"67,123.4567"}}}"#,
    ));
    let source = CoindeskSource::new(endpoint, Timeout::from_secs(5));
    let outcome = refresh(&store, &source).unwrap();

    assert!(matches!(outcome, RefreshOutcome::Updated(_)));
    let w = store.get_wallet().unwrap();
    assert_eq!(w.rate, "67123.4567".parse::<Decimal>().unwrap());
    assert_eq!(
        w.last_update,
        Some(Utc.with_ymd_and_hms(2024, 3, 18, 12, 34, 56).unwrap())
    );
}

#[test]
fn unreachable_endpoint_is_an_invalid_response() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = CoindeskSource::new(format!("http://{addr}/"), Timeout::from_secs(5));
    assert!(matches!(
        source.fetch_current(),
        Err(NetworkRequestError::InvalidResponse(_))
    ));
}
