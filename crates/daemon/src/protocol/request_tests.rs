// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tagged_serialization() {
    let json = serde_json::to_string(&Request::Ping).unwrap();
    assert_eq!(json, r#"{"type":"Ping"}"#);
}

#[test]
fn start_discovery_defaults_apply() {
    let request: Request = serde_json::from_str(
        r#"{"type": "StartDiscovery", "seeds": ["10.0.0.1"], "discovery_type": "basic"}"#,
    )
    .unwrap();
    let Request::StartDiscovery { seeds, discovery_type, concurrency, retries, credentials, .. } =
        request
    else {
        panic!("wrong variant");
    };
    assert_eq!(seeds, vec!["10.0.0.1".to_string()]);
    assert_eq!(discovery_type, "basic");
    assert_eq!(concurrency, 0);
    assert_eq!(retries, 0);
    assert!(credentials.is_none());
}

#[test]
fn status_without_id() {
    let request: Request = serde_json::from_str(r#"{"type": "Status"}"#).unwrap();
    assert_eq!(request, Request::Status { discovery_id: None });
}

#[test]
fn get_results_defaults_raw_off() {
    let request: Request =
        serde_json::from_str(r#"{"type": "GetResults", "discovery_id": "disc-abc"}"#).unwrap();
    assert_eq!(
        request,
        Request::GetResults { discovery_id: "disc-abc".to_string(), include_raw_data: false },
    );
}
