// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::config::FxSettings;
use fintrack::error::FinanceError;
use fintrack::fx::{HttpRateProvider, RateProvider};
use rust_decimal::Decimal;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Serve one canned HTTP response; the request line is sent back on the channel.
fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        let _ = tx.send(request_line.trim().to_string());
    });
    (format!("http://{}", addr), rx)
}

fn provider(endpoint: String) -> HttpRateProvider {
    HttpRateProvider::new(&FxSettings {
        endpoint,
        request_timeout: Duration::from_secs(5),
        ..FxSettings::default()
    })
    .unwrap()
}

#[test]
fn server_error_is_a_provider_error() {
    let (url, _rx) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
    let err = provider(format!("{}/latest/USD", url)).latest("USD").unwrap_err();
    assert!(matches!(err, FinanceError::ProviderError(_)));
}

#[test]
fn malformed_body_is_a_provider_error() {
    let (url, _rx) = serve_once("200 OK", "<html>not json</html>");
    let err = provider(format!("{}/latest/USD", url)).latest("USD").unwrap_err();
    assert!(matches!(err, FinanceError::ProviderError(_)));
}

#[test]
fn mismatched_base_is_a_provider_error() {
    let (url, _rx) = serve_once("200 OK", r#"{"base":"EUR","rates":{"USD":1.08}}"#);
    let err = provider(format!("{}/latest/USD", url)).latest("USD").unwrap_err();
    assert!(matches!(err, FinanceError::ProviderError(msg) if msg.contains("EUR")));
}

#[test]
fn quote_codes_are_upper_cased_decimals() {
    let (url, rx) = serve_once(
        "200 OK",
        r#"{"base":"usd","rates":{"eur":0.92,"jpy":150.5,"USD":1}}"#,
    );
    let quote = provider(format!("{}/latest/{{base}}", url)).latest("USD").unwrap();

    assert_eq!(rx.recv().unwrap(), "GET /latest/USD HTTP/1.1");
    assert_eq!(quote.base, "USD");
    assert_eq!(quote.rates.get("EUR"), Some(&Decimal::from_str("0.92").unwrap()));
    assert_eq!(quote.rates.get("JPY"), Some(&Decimal::from_str("150.5").unwrap()));
    assert!(!quote.rates.contains_key("eur"));
}
