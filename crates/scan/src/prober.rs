// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target probe pipeline: ping gate, SNMP session, system info,
//! interface tables, and LLDP/CDP neighbors.
//!
//! The prober is pure collection; reconciling the report into job
//! results and publishing it is the engine's business.

use crate::error::ScanError;
use crate::ping::Pinger;
use crate::snmp::{oids, SnmpClient, SnmpClientFactory, SnmpValue, VarBind};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{
    device_id, fallback_device_id, normalize_mac, DiscoveredDevice, DiscoveredInterface,
    DiscoveryType, JobCredentials, LinkProtocol, TopologyLink,
};
use tracing::{debug, warn};

/// Reachability gate deadline.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
/// Everything after the ping gate must finish inside this window.
pub const TARGET_TIMEOUT: Duration = Duration::from_secs(120);
/// SNMP transport open.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// The initial system-group GET.
pub const SYS_INFO_TIMEOUT: Duration = Duration::from_secs(15);

/// ifSpeed value meaning "too fast for a Gauge32, consult ifHighSpeed".
const SPEED_SENTINEL: u64 = u32::MAX as u64;

/// Job-level inputs the prober needs for each target.
#[derive(Clone)]
pub struct ProbeConfig {
    pub discovery_type: DiscoveryType,
    pub credentials: JobCredentials,
    /// Per-request SNMP timeout.
    pub timeout: Duration,
    pub retries: u32,
    pub agent_id: String,
    pub poller_id: String,
    /// Extra OIDs queried best-effort and attached to the raw payload.
    pub extra_oids: Vec<String>,
}

/// Everything one reachable target yielded.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub target: String,
    pub device: DiscoveredDevice,
    pub interfaces: Vec<DiscoveredInterface>,
    pub links: Vec<TopologyLink>,
    pub raw: serde_json::Value,
}

/// Probes one target at a time through the injected collaborators.
pub struct TargetProber {
    pinger: Arc<dyn Pinger>,
    snmp: Arc<dyn SnmpClientFactory>,
}

impl TargetProber {
    pub fn new(pinger: Arc<dyn Pinger>, snmp: Arc<dyn SnmpClientFactory>) -> Self {
        Self { pinger, snmp }
    }

    /// Probe one target. `Ok(None)` means unreachable or SNMP-silent:
    /// unsuccessful for progress purposes but not an error.
    pub async fn probe(
        &self,
        target: &str,
        cfg: &ProbeConfig,
    ) -> Result<Option<ProbeReport>, ScanError> {
        if !self.pinger.is_reachable(target, PING_TIMEOUT).await {
            debug!(target, "ping gate: unreachable, skipping SNMP");
            return Ok(None);
        }
        match tokio::time::timeout(TARGET_TIMEOUT, self.probe_reachable(target, cfg)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout),
        }
    }

    async fn probe_reachable(
        &self,
        target: &str,
        cfg: &ProbeConfig,
    ) -> Result<Option<ProbeReport>, ScanError> {
        let credentials = cfg.credentials.for_target(target);
        let client = self.snmp.create(target, credentials, cfg.timeout, cfg.retries)?;

        match tokio::time::timeout(CONNECT_TIMEOUT, client.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ScanError::Timeout),
        }

        let system =
            match tokio::time::timeout(SYS_INFO_TIMEOUT, client.get(&oids::SYSTEM_OIDS)).await {
                Ok(Ok(bindings)) => bindings,
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ScanError::Timeout),
            };
        if system.iter().all(|b| b.value.is_null_like()) {
            debug!(target, "no system variables returned, skipping");
            return Ok(None);
        }

        let mac = self.chassis_mac(client.as_ref(), target).await;
        let id = mac
            .as_deref()
            .and_then(|m| device_id(&cfg.agent_id, &cfg.poller_id, m))
            .unwrap_or_else(|| fallback_device_id(&cfg.agent_id, &cfg.poller_id, target));

        let device = DiscoveredDevice {
            device_id: id.clone(),
            ip: target.to_string(),
            mac: mac.unwrap_or_default(),
            hostname: find_str(&system, oids::SYS_NAME),
            sys_descr: find_str(&system, oids::SYS_DESCR),
            sys_object_id: find_str(&system, oids::SYS_OBJECT_ID),
            sys_contact: find_str(&system, oids::SYS_CONTACT),
            sys_location: find_str(&system, oids::SYS_LOCATION),
            uptime_seconds: find_value(&system, oids::SYS_UPTIME)
                .and_then(|v| v.as_u64())
                .map(|ticks| ticks / 100)
                .unwrap_or(0),
            first_seen_ms: 0,
            last_seen_ms: 0,
            metadata: Default::default(),
        };

        let interfaces = if cfg.discovery_type.wants_interfaces() {
            match self.collect_interfaces(client.as_ref(), target, &id).await {
                Ok(interfaces) => interfaces,
                Err(e) => {
                    warn!(target, error = %e, "interface walk failed");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let links = if cfg.discovery_type.wants_topology() {
            self.collect_topology(client.as_ref(), target, &id).await
        } else {
            Vec::new()
        };

        let mut raw = json!({
            "system": system
                .iter()
                .map(|b| (b.oid.clone(), b.value.display_string()))
                .collect::<BTreeMap<String, String>>(),
            "interface_count": interfaces.len(),
            "link_count": links.len(),
        });
        if !cfg.extra_oids.is_empty() {
            let extra: Vec<&str> = cfg.extra_oids.iter().map(String::as_str).collect();
            match client.get(&extra).await {
                Ok(bindings) => {
                    raw["extra"] = json!(bindings
                        .iter()
                        .map(|b| (b.oid.clone(), b.value.display_string()))
                        .collect::<BTreeMap<String, String>>());
                }
                Err(e) => debug!(target, error = %e, "extra OID query failed"),
            }
        }

        Ok(Some(ProbeReport { target: target.to_string(), device, interfaces, links, raw }))
    }

    /// Chassis MAC: `ifPhysAddress.1`, else the first non-empty entry of
    /// an ifPhysAddress walk.
    async fn chassis_mac(&self, client: &dyn SnmpClient, target: &str) -> Option<String> {
        match client.get(&[oids::IF_PHYS_ADDRESS_1]).await {
            Ok(bindings) => {
                if let Some(mac) = bindings.first().and_then(|b| mac_from_value(&b.value)) {
                    return Some(mac);
                }
            }
            Err(e) => debug!(target, error = %e, "ifPhysAddress.1 query failed"),
        }
        match client.bulk_walk(oids::IF_PHYS_ADDRESS).await {
            Ok(bindings) => bindings.iter().find_map(|b| mac_from_value(&b.value)),
            Err(e) => {
                debug!(target, error = %e, "ifPhysAddress walk failed");
                None
            }
        }
    }

    async fn collect_interfaces(
        &self,
        client: &dyn SnmpClient,
        target: &str,
        device_id: &str,
    ) -> Result<Vec<DiscoveredInterface>, ScanError> {
        #[derive(Default)]
        struct Build {
            descr: String,
            if_type: i32,
            speed: u64,
            phys: String,
            admin: i32,
            oper: i32,
            name: String,
            alias: String,
            high_mbps: Option<u64>,
            ips: Vec<String>,
        }
        let mut rows: BTreeMap<i32, Build> = BTreeMap::new();

        for binding in client.bulk_walk(oids::IF_DESCR).await? {
            if let Some(idx) = index_after(oids::IF_DESCR, &binding.oid) {
                rows.entry(idx).or_default().descr = binding.value.display_string();
            }
        }
        for binding in client.bulk_walk(oids::IF_TYPE).await? {
            if let Some(idx) = index_after(oids::IF_TYPE, &binding.oid) {
                rows.entry(idx).or_default().if_type =
                    binding.value.as_i32_saturating().unwrap_or(0);
            }
        }
        for binding in client.bulk_walk(oids::IF_SPEED).await? {
            if let Some(idx) = index_after(oids::IF_SPEED, &binding.oid) {
                rows.entry(idx).or_default().speed = binding.value.as_u64().unwrap_or(0);
            }
        }
        for binding in client.bulk_walk(oids::IF_PHYS_ADDRESS).await? {
            if let Some(idx) = index_after(oids::IF_PHYS_ADDRESS, &binding.oid) {
                rows.entry(idx).or_default().phys =
                    mac_from_value(&binding.value).unwrap_or_default();
            }
        }
        for binding in client.bulk_walk(oids::IF_ADMIN_STATUS).await? {
            if let Some(idx) = index_after(oids::IF_ADMIN_STATUS, &binding.oid) {
                rows.entry(idx).or_default().admin =
                    binding.value.as_i32_saturating().unwrap_or(0);
            }
        }
        for binding in client.bulk_walk(oids::IF_OPER_STATUS).await? {
            if let Some(idx) = index_after(oids::IF_OPER_STATUS, &binding.oid) {
                rows.entry(idx).or_default().oper = binding.value.as_i32_saturating().unwrap_or(0);
            }
        }

        // ifXTable names and aliases.
        for binding in client.bulk_walk(oids::IF_NAME).await.unwrap_or_default() {
            if let Some(idx) = index_after(oids::IF_NAME, &binding.oid) {
                rows.entry(idx).or_default().name = binding.value.display_string();
            }
        }
        for binding in client.bulk_walk(oids::IF_ALIAS).await.unwrap_or_default() {
            if let Some(idx) = index_after(oids::IF_ALIAS, &binding.oid) {
                rows.entry(idx).or_default().alias = binding.value.display_string();
            }
        }

        // A Gauge32 cannot express >= 4.3 Gb/s: 2^32-1 (and 0) mean
        // "consult ifHighSpeed", never a literal speed.
        let needs_high =
            rows.values().any(|row| row.speed == 0 || row.speed == SPEED_SENTINEL);
        if needs_high {
            for binding in client.bulk_walk(oids::IF_HIGH_SPEED).await.unwrap_or_default() {
                if let Some(idx) = index_after(oids::IF_HIGH_SPEED, &binding.oid) {
                    if let Some(row) = rows.get_mut(&idx) {
                        row.high_mbps = binding.value.as_u64();
                    }
                }
            }
        }

        // ipAddrTable: the instance suffix is the address, the value the
        // ifIndex it belongs to.
        match client.bulk_walk(oids::IP_AD_ENT_IF_INDEX).await {
            Ok(bindings) => {
                for binding in bindings {
                    let Some(ip) = ip_suffix(oids::IP_AD_ENT_IF_INDEX, &binding.oid) else {
                        continue;
                    };
                    let Some(idx) =
                        binding.value.as_i32_saturating().filter(|idx| *idx > 0)
                    else {
                        continue;
                    };
                    if let Some(row) = rows.get_mut(&idx) {
                        row.ips.push(ip);
                    }
                }
            }
            Err(e) => debug!(target, error = %e, "ipAddrTable walk failed"),
        }

        Ok(rows
            .into_iter()
            .map(|(idx, row)| {
                let speed_bps = if row.speed == 0 || row.speed == SPEED_SENTINEL {
                    row.high_mbps.map(|mbps| mbps.saturating_mul(1_000_000)).unwrap_or(0)
                } else {
                    row.speed
                };
                let name = if !row.name.is_empty() {
                    row.name
                } else if !row.descr.is_empty() {
                    row.descr.clone()
                } else {
                    format!("Interface-{}", idx)
                };
                DiscoveredInterface {
                    device_ip: target.to_string(),
                    device_id: device_id.to_string(),
                    if_index: idx,
                    if_name: name,
                    if_descr: row.descr,
                    if_alias: row.alias,
                    if_speed_bps: speed_bps,
                    if_phys_address: row.phys,
                    ip_addresses: row.ips,
                    if_admin_status: row.admin,
                    if_oper_status: row.oper,
                    if_type: row.if_type,
                    metadata: Default::default(),
                }
            })
            .collect())
    }

    /// LLDP first; CDP only when LLDP yields nothing. Query errors are
    /// logged and produce an empty result.
    async fn collect_topology(
        &self,
        client: &dyn SnmpClient,
        target: &str,
        device_id: &str,
    ) -> Vec<TopologyLink> {
        match self.collect_lldp(client, target, device_id).await {
            Ok(links) if !links.is_empty() => return links,
            Ok(_) => {}
            Err(e) => warn!(target, error = %e, "LLDP walk failed"),
        }
        match self.collect_cdp(client, target, device_id).await {
            Ok(links) => links,
            Err(e) => {
                warn!(target, error = %e, "CDP walk failed");
                Vec::new()
            }
        }
    }

    async fn collect_lldp(
        &self,
        client: &dyn SnmpClient,
        target: &str,
        device_id: &str,
    ) -> Result<Vec<TopologyLink>, ScanError> {
        #[derive(Default)]
        struct Build {
            chassis: String,
            port: String,
            port_desc: String,
            sys_name: String,
            mgmt: String,
        }
        // Row key: (timeMark, localPortNum, remIndex).
        let mut rows: BTreeMap<Vec<u64>, Build> = BTreeMap::new();

        for binding in client.bulk_walk(oids::LLDP_REM_CHASSIS_ID).await? {
            if let Some(key) = suffix_arcs(oids::LLDP_REM_CHASSIS_ID, &binding.oid) {
                rows.entry(key).or_default().chassis = octet_id_string(&binding.value);
            }
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for binding in client.bulk_walk(oids::LLDP_REM_PORT_ID).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::LLDP_REM_PORT_ID, &binding.oid) {
                rows.entry(key).or_default().port = octet_id_string(&binding.value);
            }
        }
        for binding in client.bulk_walk(oids::LLDP_REM_PORT_DESC).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::LLDP_REM_PORT_DESC, &binding.oid) {
                rows.entry(key).or_default().port_desc = binding.value.display_string();
            }
        }
        for binding in client.bulk_walk(oids::LLDP_REM_SYS_NAME).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::LLDP_REM_SYS_NAME, &binding.oid) {
                rows.entry(key).or_default().sys_name = binding.value.display_string();
            }
        }
        // Management addresses live in their own table; the address is
        // encoded in the instance OID after (row key, subtype).
        for binding in
            client.bulk_walk(oids::LLDP_REM_MAN_ADDR_IF_SUBTYPE).await.unwrap_or_default()
        {
            let Some(suffix) = suffix_arcs(oids::LLDP_REM_MAN_ADDR_IF_SUBTYPE, &binding.oid)
            else {
                continue;
            };
            if suffix.len() < 8 {
                continue;
            }
            let key = suffix[..3].to_vec();
            let subtype = suffix[3];
            let addr = &suffix[4..];
            if subtype != 1 {
                continue;
            }
            // IPv4, optionally with an explicit length arc.
            let octets: &[u64] = match addr.len() {
                4 => addr,
                5 if addr[0] == 4 => &addr[1..],
                _ => continue,
            };
            if octets.iter().all(|o| *o <= 255) {
                if let Some(row) = rows.get_mut(&key) {
                    row.mgmt = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
                }
            }
        }

        Ok(rows
            .into_iter()
            .map(|(key, row)| {
                let mut link = TopologyLink::new(LinkProtocol::Lldp, target);
                link.local_device_id = device_id.to_string();
                link.local_if_index = key.get(1).map(|p| *p as i32).unwrap_or(0);
                link.neighbor_chassis_id = row.chassis;
                link.neighbor_port_id = row.port;
                link.neighbor_port_descr = row.port_desc;
                link.neighbor_system_name = row.sys_name;
                link.neighbor_mgmt_addr = row.mgmt;
                link
            })
            .collect())
    }

    async fn collect_cdp(
        &self,
        client: &dyn SnmpClient,
        target: &str,
        device_id: &str,
    ) -> Result<Vec<TopologyLink>, ScanError> {
        #[derive(Default)]
        struct Build {
            address: String,
            neighbor: String,
            port: String,
            platform: String,
        }
        // Row key: (ifIndex, deviceIndex).
        let mut rows: BTreeMap<Vec<u64>, Build> = BTreeMap::new();

        for binding in client.bulk_walk(oids::CDP_CACHE_DEVICE_ID).await? {
            if let Some(key) = suffix_arcs(oids::CDP_CACHE_DEVICE_ID, &binding.oid) {
                rows.entry(key).or_default().neighbor = binding.value.display_string();
            }
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        for binding in client.bulk_walk(oids::CDP_CACHE_ADDRESS).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::CDP_CACHE_ADDRESS, &binding.oid) {
                let addr = binding
                    .value
                    .as_bytes()
                    .filter(|b| b.len() == 4)
                    .map(|b| format!("{}.{}.{}.{}", b[0], b[1], b[2], b[3]))
                    .unwrap_or_default();
                rows.entry(key).or_default().address = addr;
            }
        }
        for binding in client.bulk_walk(oids::CDP_CACHE_DEVICE_PORT).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::CDP_CACHE_DEVICE_PORT, &binding.oid) {
                rows.entry(key).or_default().port = binding.value.display_string();
            }
        }
        for binding in client.bulk_walk(oids::CDP_CACHE_PLATFORM).await.unwrap_or_default() {
            if let Some(key) = suffix_arcs(oids::CDP_CACHE_PLATFORM, &binding.oid) {
                rows.entry(key).or_default().platform = binding.value.display_string();
            }
        }

        Ok(rows
            .into_iter()
            .map(|(key, row)| {
                let mut link = TopologyLink::new(LinkProtocol::Cdp, target);
                link.local_device_id = device_id.to_string();
                link.local_if_index = key.first().map(|p| *p as i32).unwrap_or(0);
                link.neighbor_system_name = row.neighbor;
                link.neighbor_port_id = row.port;
                link.neighbor_mgmt_addr = row.address;
                if !row.platform.is_empty() {
                    link.metadata.insert("platform".to_string(), row.platform);
                }
                link
            })
            .collect())
    }
}

fn find_value<'a>(bindings: &'a [VarBind], oid: &str) -> Option<&'a SnmpValue> {
    bindings.iter().find(|b| b.oid == oid).map(|b| &b.value)
}

fn find_str(bindings: &[VarBind], oid: &str) -> String {
    find_value(bindings, oid).map(|v| v.display_string()).unwrap_or_default()
}

/// Interpret an SNMP value as a MAC address: six raw octets, or a
/// printable MAC string.
fn mac_from_value(value: &SnmpValue) -> Option<String> {
    let bytes = value.as_bytes()?;
    if bytes.len() == 6 {
        if bytes.iter().all(|b| *b == 0) {
            return None;
        }
        let mut out = String::with_capacity(17);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            out.push_str(&format!("{:02x}", byte));
        }
        return Some(out);
    }
    normalize_mac(&String::from_utf8_lossy(bytes))
}

/// Neighbor identifiers are opaque octets: often a MAC, sometimes a
/// name. Render accordingly.
fn octet_id_string(value: &SnmpValue) -> String {
    if let Some(mac) = mac_from_value(value) {
        return mac;
    }
    value.display_string()
}

/// Parse the single trailing arc after a column OID.
fn index_after(prefix: &str, oid: &str) -> Option<i32> {
    let rest = oid.strip_prefix(prefix)?.strip_prefix('.')?;
    if rest.contains('.') {
        return None;
    }
    rest.parse().ok()
}

/// Arcs after a column OID.
fn suffix_arcs(prefix: &str, oid: &str) -> Option<Vec<u64>> {
    let rest = oid.strip_prefix(prefix)?.strip_prefix('.')?;
    rest.split('.').map(str::parse::<u64>).collect::<Result<Vec<_>, _>>().ok()
}

/// Dotted IPv4/IPv6 instance suffix (ipAddrTable style).
fn ip_suffix(prefix: &str, oid: &str) -> Option<String> {
    let arcs = suffix_arcs(prefix, oid)?;
    if arcs.len() == 4 && arcs.iter().all(|a| *a <= 255) {
        return Some(format!("{}.{}.{}.{}", arcs[0], arcs[1], arcs[2], arcs[3]));
    }
    None
}

#[cfg(test)]
#[path = "prober_tests.rs"]
mod tests;
