// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    radios = { json!(["radios"]) },
    ports_marker = { json!(["ports"]) },
    empty = { json!([]) },
    null = { json!(null) },
)]
fn sentinel_shapes_are_recognized(value: serde_json::Value) {
    assert_eq!(InterfacesField::parse(&value), InterfacesField::Sentinel);
}

#[parameterized(
    number = { json!(42) },
    string = { json!("ports") },
    object_without_ports = { json!({"radios": []}) },
    mixed_array = { json!(["ports", {"idx": 1}]) },
)]
fn unknown_shapes_are_other(value: serde_json::Value) {
    assert_eq!(InterfacesField::parse(&value), InterfacesField::Other);
}

#[test]
fn ports_schema_parses() {
    let value = json!({
        "ports": [
            {"idx": 1, "name": "Port 1", "state": "up", "speedMbps": 1000},
            {"idx": 2, "name": "", "state": "disabled", "speedMbps": 0, "poeEnabled": true},
        ]
    });
    let InterfacesField::Ports(ports) = InterfacesField::parse(&value) else {
        panic!("expected ports");
    };
    assert_eq!(ports.len(), 2);
    assert_eq!(ports[0].speed_mbps, 1000);
    assert_eq!(ports[1].poe_enabled, Some(true));
}

#[test]
fn malformed_ports_array_is_other() {
    let value = json!({"ports": [{"idx": "one"}]});
    assert_eq!(InterfacesField::parse(&value), InterfacesField::Other);
}

#[test]
fn port_to_interface_scales_speed_and_maps_status() {
    let port = SwitchPort {
        idx: 3,
        name: "Port 3".into(),
        state: "up".into(),
        speed_mbps: 10_000,
        poe_enabled: Some(true),
        poe_power_w: Some(12.5),
    };
    let iface = port.to_interface("10.0.0.1", "a:p:aa:bb:cc:dd:ee:ff");
    assert_eq!(iface.if_index, 3);
    assert_eq!(iface.if_speed_bps, 10_000_000_000);
    assert_eq!(iface.if_admin_status, 1);
    assert_eq!(iface.if_oper_status, 1);
    assert_eq!(iface.metadata["poe_enabled"], "true");
    assert_eq!(iface.metadata["poe_power_w"], "12.5");
}

#[parameterized(
    down = { "down", 2 },
    disabled = { "disabled", 2 },
    up = { "up", 1 },
    unknown = { "flapping", 1 },
)]
fn port_status_codes(state: &str, expected: i32) {
    let port = SwitchPort { idx: 1, state: state.into(), ..Default::default() };
    let iface = port.to_interface("10.0.0.1", "id");
    assert_eq!(iface.if_oper_status, expected);
}

#[test]
fn port_speed_saturates() {
    let port = SwitchPort { idx: 1, speed_mbps: u64::MAX, ..Default::default() };
    let iface = port.to_interface("10.0.0.1", "id");
    assert_eq!(iface.if_speed_bps, u64::MAX);
}

#[test]
fn nameless_port_synthesizes_name() {
    let port = SwitchPort { idx: 7, ..Default::default() };
    assert_eq!(port.to_interface("10.0.0.1", "id").if_name, "Port 7");
}

#[test]
fn device_detail_aliases_parse() {
    let detail: DeviceDetails = serde_json::from_value(json!({
        "id": "dev-1",
        "ipAddress": "10.0.0.2",
        "macAddress": "aa:bb:cc:dd:ee:ff",
        "lldpTable": [{"chassisId": "c1", "portId": "p1", "localPortIdx": 4}],
        "uplink": {"deviceId": "dev-0"},
    }))
    .unwrap();
    assert_eq!(detail.ip, "10.0.0.2");
    assert_eq!(detail.lldp_table.len(), 1);
    assert_eq!(detail.lldp_table[0].local_port_idx, 4);
    assert_eq!(detail.uplink.unwrap().device_id, "dev-0");
}

#[test]
fn switching_feature_detection() {
    let device: UnifiDevice = serde_json::from_value(json!({
        "id": "d",
        "features": ["switching", "accessPoint"],
    }))
    .unwrap();
    assert!(device.is_switch());
    let ap: UnifiDevice =
        serde_json::from_value(json!({"id": "d2", "features": ["accessPoint"]})).unwrap();
    assert!(!ap.is_switch());
}
