// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    bare_seconds = { "30", 30 },
    seconds = { "30s", 30 },
    minutes = { "5m", 300 },
    hours = { "2h", 7200 },
    days = { "1d", 86400 },
    spaced = { " 45s ", 45 },
)]
fn parses_suffixes(input: &str, secs: u64) {
    assert_eq!(parse_duration(input), Ok(Duration::from_secs(secs)));
}

#[test]
fn parses_milliseconds() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
}

#[parameterized(
    empty = { "" },
    letters = { "abc" },
    bad_suffix = { "5y" },
    negative = { "-5s" },
)]
fn rejects_bad_input(input: &str) {
    assert!(parse_duration(input).is_err());
}

#[parameterized(
    seconds = { 30, "30s" },
    minutes = { 300, "5m" },
    hours = { 7200, "2h" },
    days = { 86400, "1d" },
)]
fn formats_round_numbers(secs: u64, expected: &str) {
    assert_eq!(format_duration(Duration::from_secs(secs)), expected);
}

#[test]
fn format_parse_round_trip() {
    for secs in [1, 59, 60, 3600, 86400, 90000] {
        let d = Duration::from_secs(secs);
        assert_eq!(parse_duration(&format_duration(d)), Ok(d));
    }
}

#[test]
fn serde_adapter_round_trips() {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct Holder {
        #[serde(with = "duration_str")]
        timeout: Duration,
    }
    let holder: Holder = serde_json::from_str(r#"{"timeout": "45s"}"#).unwrap();
    assert_eq!(holder.timeout, Duration::from_secs(45));
    assert_eq!(serde_json::to_string(&holder).unwrap(), r#"{"timeout":"45s"}"#);
}
