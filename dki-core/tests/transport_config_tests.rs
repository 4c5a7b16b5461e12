// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for network::transport configuration

use std::collections::HashMap;
use std::time::Duration;

use dki_core::network::*;
use proptest::prelude::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = TransportConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    assert_eq!(config.max_reconnect_attempts, 5);
    assert_eq!(config.reconnect_delay(0), Duration::from_millis(1000));
    assert_eq!(config.reconnect_delay(4), Duration::from_millis(16000));
    assert_eq!(config.reconnect_delay(5), Duration::from_millis(30000));
}

#[test]
fn test_endpoint_variants() {
    let cases = [
        (
            "ws://localhost:8000/api/v1",
            "ws://localhost:8000/api/v1/ws/notifications?token=t",
        ),
        (
            "ws://localhost:8000/api/v1/",
            "ws://localhost:8000/api/v1/ws/notifications?token=t",
        ),
        (
            "https://plants.example.com/api/v1",
            "wss://plants.example.com/api/v1/ws/notifications?token=t",
        ),
        (
            "http://127.0.0.1:8000",
            "ws://127.0.0.1:8000/ws/notifications?token=t",
        ),
    ];

    for (base, expected) in cases {
        let config = TransportConfig::with_base_url(base);
        assert_eq!(config.endpoint("t").unwrap().as_str(), expected, "base {base}");
    }
}

#[test]
fn test_endpoint_encodes_token() {
    let config = TransportConfig::default();
    let url = config.endpoint("a b&c=d").unwrap();
    assert_eq!(
        url.query_pairs().next().map(|(k, v)| (k.into_owned(), v.into_owned())),
        Some(("token".to_string(), "a b&c=d".to_string()))
    );
}

#[test]
fn test_endpoint_rejects_bad_base() {
    let config = TransportConfig::with_base_url("ftp://example.com");
    assert!(matches!(config.endpoint("t"), Err(NetworkError::InvalidUrl(_))));

    let config = TransportConfig::with_base_url("not a url");
    assert!(matches!(config.endpoint("t"), Err(NetworkError::InvalidUrl(_))));
}

#[test]
fn test_from_lookup_overrides() {
    let config = TransportConfig::from_lookup(lookup(&[
        ("DKI_WS_URL", "wss://plants.example.com/api/v1"),
        ("DKI_HEARTBEAT_MS", "15000"),
        ("DKI_MAX_RECONNECT_ATTEMPTS", "3"),
    ]))
    .unwrap();

    assert_eq!(config.base_url, "wss://plants.example.com/api/v1");
    assert_eq!(config.heartbeat_interval_ms, 15_000);
    assert_eq!(config.max_reconnect_attempts, 3);
    assert_eq!(config.reconnect_base_delay_ms, 1_000);
}

#[test]
fn test_from_lookup_empty_keeps_defaults() {
    let config = TransportConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, TransportConfig::default());
}

#[test]
fn test_from_lookup_rejects_invalid_values() {
    let result = TransportConfig::from_lookup(lookup(&[("DKI_HEARTBEAT_MS", "often")]));
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

    let result = TransportConfig::from_lookup(lookup(&[("DKI_WS_URL", "gopher://x")]));
    assert_eq!(
        result.unwrap_err(),
        ConfigError::UnsupportedScheme("gopher".into())
    );
}

proptest! {
    #[test]
    fn prop_reconnect_delay_matches_formula(attempt in 0u32..64) {
        let config = TransportConfig::default();
        let expected = (1000u128 * 2u128.pow(attempt)).min(30_000) as u64;
        prop_assert_eq!(config.reconnect_delay(attempt), Duration::from_millis(expected));
    }

    #[test]
    fn prop_reconnect_delay_is_monotonic(attempt in 0u32..200) {
        let config = TransportConfig::default();
        prop_assert!(config.reconnect_delay(attempt) <= config.reconnect_delay(attempt + 1));
        prop_assert!(config.reconnect_delay(attempt) <= Duration::from_secs(30));
    }
}
