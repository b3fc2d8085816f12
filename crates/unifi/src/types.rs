// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload types for the UniFi Network integration API, limited to the
//! fields the engine consumes.

use serde::{Deserialize, Serialize};
use sweep_core::DiscoveredInterface;

/// One configured controller endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Display name for logs and metadata.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Site {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Device row from the site device listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnifiDevice {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "macAddress")]
    pub mac: String,
    #[serde(default, alias = "ipAddress")]
    pub ip: String,
    #[serde(default)]
    pub model: String,
    /// Capability tags; switches carry `"switching"`.
    #[serde(default)]
    pub features: Vec<String>,
    /// Polymorphic: a ports object, or a capability-sentinel array.
    #[serde(default)]
    pub interfaces: serde_json::Value,
}

impl UnifiDevice {
    pub fn is_switch(&self) -> bool {
        self.features.iter().any(|f| f == "switching")
    }
}

/// Device detail payload: the listing row plus neighbor tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDetails {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "macAddress")]
    pub mac: String,
    #[serde(default, alias = "ipAddress")]
    pub ip: String,
    #[serde(default)]
    pub uplink: Option<Uplink>,
    #[serde(default, alias = "lldpTable")]
    pub lldp_table: Vec<LldpEntry>,
    #[serde(default, alias = "portTable")]
    pub port_table: Vec<Port>,
    #[serde(default)]
    pub interfaces: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Uplink {
    #[serde(default, alias = "deviceId", alias = "uplink_device_id")]
    pub device_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LldpEntry {
    #[serde(default, alias = "chassisId")]
    pub chassis_id: String,
    #[serde(default, alias = "portId")]
    pub port_id: String,
    #[serde(default, alias = "portDescr")]
    pub port_descr: String,
    #[serde(default, alias = "systemName")]
    pub system_name: String,
    #[serde(default, alias = "mgmtAddr", alias = "managementAddress")]
    pub mgmt_addr: String,
    #[serde(default, alias = "localPortIdx")]
    pub local_port_idx: i32,
    #[serde(default, alias = "localPortName")]
    pub local_port_name: String,
}

/// Physical switch port from the detail payload's port table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Port {
    #[serde(default)]
    pub idx: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "connectedDevice")]
    pub connected_device: Option<ConnectedDevice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectedDevice {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "macAddress")]
    pub mac: String,
    #[serde(default, alias = "ipAddress")]
    pub ip: String,
}

/// The duck-typed `interfaces` device field, resolved to one of its
/// known shapes. Sentinel arrays (`["ports"]`, `["radios"]`, `[]`) name
/// capabilities without carrying data; only the structured ports object
/// yields interface records.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfacesField {
    /// Structured switch-port list.
    Ports(Vec<SwitchPort>),
    /// Recognized capability marker; nothing to emit.
    Sentinel,
    /// Unrecognized shape; nothing to emit, nothing to report.
    Other,
}

/// One entry of the structured `interfaces.ports` schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SwitchPort {
    #[serde(default)]
    pub idx: i32,
    #[serde(default)]
    pub name: String,
    /// `up`, `down`, or `disabled`.
    #[serde(default)]
    pub state: String,
    #[serde(default, alias = "speedMbps")]
    pub speed_mbps: u64,
    #[serde(default, alias = "poeEnabled")]
    pub poe_enabled: Option<bool>,
    #[serde(default, alias = "poePowerW")]
    pub poe_power_w: Option<f64>,
}

impl InterfacesField {
    /// Resolve the opaque field. Deserialization failure of the ports
    /// shape is not meaningful; it just means "not the ports schema".
    pub fn parse(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                if items.iter().all(|item| item.is_string()) {
                    InterfacesField::Sentinel
                } else {
                    InterfacesField::Other
                }
            }
            serde_json::Value::Object(map) => match map.get("ports") {
                Some(ports) => {
                    match serde_json::from_value::<Vec<SwitchPort>>(ports.clone()) {
                        Ok(ports) => InterfacesField::Ports(ports),
                        Err(_) => InterfacesField::Other,
                    }
                }
                None => InterfacesField::Other,
            },
            serde_json::Value::Null => InterfacesField::Sentinel,
            _ => InterfacesField::Other,
        }
    }
}

impl SwitchPort {
    /// Interface record for this port. Status codes follow ifTable
    /// conventions: `down`/`disabled` map to 2, everything else to 1.
    pub fn to_interface(&self, device_ip: &str, device_id: &str) -> DiscoveredInterface {
        let status = if self.state == "down" || self.state == "disabled" { 2 } else { 1 };
        let mut iface = DiscoveredInterface {
            device_ip: device_ip.to_string(),
            device_id: device_id.to_string(),
            if_index: self.idx,
            if_name: if self.name.is_empty() {
                format!("Port {}", self.idx)
            } else {
                self.name.clone()
            },
            if_speed_bps: self.speed_mbps.saturating_mul(1_000_000),
            if_admin_status: status,
            if_oper_status: status,
            ..Default::default()
        };
        if let Some(poe) = self.poe_enabled {
            iface.metadata.insert("poe_enabled".to_string(), poe.to_string());
        }
        if let Some(power) = self.poe_power_w {
            iface.metadata.insert("poe_power_w".to_string(), power.to_string());
        }
        iface
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
