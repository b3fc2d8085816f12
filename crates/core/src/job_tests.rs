// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    full = { "full", DiscoveryType::Full },
    basic = { "basic", DiscoveryType::Basic },
    interfaces = { "interfaces", DiscoveryType::Interfaces },
    topology = { "topology", DiscoveryType::Topology },
)]
fn discovery_type_parses(input: &str, expected: DiscoveryType) {
    assert_eq!(input.parse::<DiscoveryType>().unwrap(), expected);
    assert_eq!(expected.to_string(), input);
}

#[test]
fn discovery_type_rejects_unknown() {
    let err = "ping-sweep".parse::<DiscoveryType>().unwrap_err();
    assert_eq!(err, ParseDiscoveryTypeError("ping-sweep".to_string()));
}

#[parameterized(
    full = { DiscoveryType::Full, true, true },
    basic = { DiscoveryType::Basic, false, false },
    interfaces = { DiscoveryType::Interfaces, true, false },
    topology = { DiscoveryType::Topology, false, true },
)]
fn discovery_type_query_gates(t: DiscoveryType, interfaces: bool, topology: bool) {
    assert_eq!(t.wants_interfaces(), interfaces);
    assert_eq!(t.wants_topology(), topology);
}

#[test]
fn job_state_terminality() {
    assert!(!JobState::Pending.is_terminal());
    assert!(!JobState::Running.is_terminal());
    assert!(JobState::Completed.is_terminal());
    assert!(JobState::Failed.is_terminal());
    assert!(JobState::Canceled.is_terminal());
}

#[test]
fn job_state_serde_lowercase() {
    assert_eq!(serde_json::to_string(&JobState::Canceled).unwrap(), "\"canceled\"");
}

#[test]
fn job_id_has_disc_prefix() {
    let id = JobId::new();
    assert!(id.as_str().starts_with("disc-"));
}

#[test]
fn params_builder_defaults() {
    let params = JobParams::builder().build();
    assert_eq!(params.seeds, vec!["192.168.1.1".to_string()]);
    assert_eq!(params.discovery_type, DiscoveryType::Basic);
    assert_eq!(params.concurrency, 0);
    assert!(params.credentials.is_none());
}

#[test]
fn params_setters_chain() {
    let params = JobParams::new(vec!["10.0.0.0/24".into()], DiscoveryType::Full)
        .agent_id("a1")
        .poller_id("p1")
        .concurrency(8)
        .retries(2);
    assert_eq!(params.agent_id, "a1");
    assert_eq!(params.concurrency, 8);
    assert_eq!(params.retries, 2);
}

#[test]
fn status_defaults_pending() {
    let status = JobStatus::default();
    assert_eq!(status.state, JobState::Pending);
    assert_eq!(status.end_ms, 0);
    assert_eq!(status.progress, 0.0);
}

#[test]
fn results_without_raw_strips_only_raw() {
    let mut results = JobResults::default();
    results.devices.push(crate::device::DiscoveredDevice::builder().ip("1.2.3.4").build());
    results.raw.insert("1.2.3.4".to_string(), serde_json::json!({"sysDescr": "x"}));

    let stripped = results.without_raw();
    assert_eq!(stripped.devices.len(), 1);
    assert!(stripped.raw.is_empty());
    // Original is untouched.
    assert_eq!(results.raw.len(), 1);
}
