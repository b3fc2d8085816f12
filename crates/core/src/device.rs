// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovered device, interface, and topology-link records, plus the
//! MAC normalization and DeviceID derivation rules shared by every
//! collector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalize a MAC address to lowercase colon-separated hex.
///
/// Accepts `aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF`, `aabb.ccdd.eeff`,
/// and bare `aabbccddeeff` input. Returns `None` for anything that does
/// not contain exactly six octets of hex.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 || raw.chars().any(|c| !c.is_ascii_hexdigit() && !":-.".contains(c)) {
        return None;
    }
    let lower = hex.to_ascii_lowercase();
    let mut out = String::with_capacity(17);
    for (i, chunk) in lower.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        // chunks(2) over a 12-byte ASCII string always yields valid UTF-8 pairs
        out.push(chunk[0] as char);
        out.push(chunk[1] as char);
    }
    Some(out)
}

/// Canonical DeviceID for a device with a known MAC:
/// `{agent_id}:{poller_id}:{normalized_mac}`.
///
/// Returns `None` when the MAC does not normalize or any component is
/// empty.
pub fn device_id(agent_id: &str, poller_id: &str, mac: &str) -> Option<String> {
    if agent_id.is_empty() || poller_id.is_empty() {
        return None;
    }
    let mac = normalize_mac(mac)?;
    Some(format!("{}:{}:{}", agent_id, poller_id, mac))
}

/// IP-derived DeviceID fallback for devices without a usable MAC.
/// Stable only within a single job.
pub fn fallback_device_id(agent_id: &str, poller_id: &str, ip: &str) -> String {
    format!("{}:{}:{}", agent_id, poller_id, ip)
}

/// Metadata key recording an additional IP observed for an already-known
/// device.
pub fn alternate_ip_key(ip: &str) -> String {
    format!("alternate_ip_{}", ip)
}

/// A device observed by SNMP polling or UniFi enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Canonical identity; empty only when the MAC is also empty.
    #[serde(default)]
    pub device_id: String,
    pub ip: String,
    /// Normalized MAC, or empty when unknown.
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub sys_descr: String,
    #[serde(default)]
    pub sys_object_id: String,
    #[serde(default)]
    pub sys_contact: String,
    #[serde(default)]
    pub sys_location: String,
    /// Uptime in seconds, as reported by the device.
    #[serde(default)]
    pub uptime_seconds: u64,
    #[serde(default)]
    pub first_seen_ms: u64,
    #[serde(default)]
    pub last_seen_ms: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// One row of a device's interface table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredInterface {
    pub device_ip: String,
    #[serde(default)]
    pub device_id: String,
    pub if_index: i32,
    #[serde(default)]
    pub if_name: String,
    #[serde(default)]
    pub if_descr: String,
    #[serde(default)]
    pub if_alias: String,
    /// Speed in bits per second; saturated at u64::MAX on overflow.
    #[serde(default)]
    pub if_speed_bps: u64,
    /// Normalized MAC of the port, or empty.
    #[serde(default)]
    pub if_phys_address: String,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub if_admin_status: i32,
    #[serde(default)]
    pub if_oper_status: i32,
    #[serde(default)]
    pub if_type: i32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Source protocol of a topology link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkProtocol {
    #[serde(rename = "LLDP")]
    Lldp,
    #[serde(rename = "CDP")]
    Cdp,
    #[serde(rename = "UniFi-API")]
    UnifiApi,
}

crate::simple_display! {
    LinkProtocol {
        Lldp => "LLDP",
        Cdp => "CDP",
        UnifiApi => "UniFi-API",
    }
}

/// A directed neighbor adjacency between a local interface and a remote
/// chassis/port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyLink {
    pub protocol: LinkProtocol,
    pub local_device_ip: String,
    #[serde(default)]
    pub local_device_id: String,
    #[serde(default)]
    pub local_if_index: i32,
    #[serde(default)]
    pub local_if_name: String,
    #[serde(default)]
    pub neighbor_chassis_id: String,
    #[serde(default)]
    pub neighbor_port_id: String,
    #[serde(default)]
    pub neighbor_port_descr: String,
    #[serde(default)]
    pub neighbor_system_name: String,
    #[serde(default)]
    pub neighbor_mgmt_addr: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl TopologyLink {
    /// Empty link skeleton for the given protocol and local device.
    pub fn new(protocol: LinkProtocol, local_device_ip: impl Into<String>) -> Self {
        Self {
            protocol,
            local_device_ip: local_device_ip.into(),
            local_device_id: String::new(),
            local_if_index: 0,
            local_if_name: String::new(),
            neighbor_chassis_id: String::new(),
            neighbor_port_id: String::new(),
            neighbor_port_descr: String::new(),
            neighbor_system_name: String::new(),
            neighbor_mgmt_addr: String::new(),
            metadata: HashMap::new(),
        }
    }
}

crate::builder! {
    pub struct DiscoveredDeviceBuilder => DiscoveredDevice {
        into {
            device_id: String = "",
            ip: String = "192.168.1.1",
            mac: String = "",
            hostname: String = "",
            sys_descr: String = "",
            sys_object_id: String = "",
            sys_contact: String = "",
            sys_location: String = "",
        }
        set {
            uptime_seconds: u64 = 0,
            first_seen_ms: u64 = 0,
            last_seen_ms: u64 = 0,
            metadata: HashMap<String, String> = HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
