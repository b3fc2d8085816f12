// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device reconciliation: merge newly observed records into a job's
//! result set.
//!
//! Mutation happens under the job mutex; the returned copies are what
//! the caller publishes, outside the critical section. A terminal job is
//! never mutated.

use crate::job::JobHandle;
use sweep_core::{
    alternate_ip_key, device_id, fallback_device_id, DiscoveredDevice, DiscoveredInterface,
    TopologyLink,
};

/// Merge one device into the job. Returns the record to publish, or
/// `None` when the job is already terminal.
pub(crate) fn merge_device(
    job: &JobHandle,
    mut device: DiscoveredDevice,
    now_ms: u64,
) -> Option<DiscoveredDevice> {
    let agent_id = job.params.agent_id.clone();
    let poller_id = job.params.poller_id.clone();

    job.with_inner(|inner| {
        if inner.status.state.is_terminal() {
            return None;
        }

        if device.device_id.is_empty() && !device.mac.is_empty() {
            if let Some(id) = device_id(&agent_id, &poller_id, &device.mac) {
                device.device_id = id;
            }
        }

        let matched = inner.results.devices.iter().position(|existing| matches(existing, &device));
        let merged = match matched {
            Some(index) => {
                let existing = &mut inner.results.devices[index];
                merge_into(existing, &device);
                existing.last_seen_ms = now_ms;
                if !device.ip.is_empty() && existing.ip != device.ip {
                    existing
                        .metadata
                        .insert(alternate_ip_key(&device.ip), device.ip.clone());
                }
                if !existing.mac.is_empty() {
                    inner.mac_index.insert(existing.mac.clone(), index);
                }
                existing.clone()
            }
            None => {
                device.first_seen_ms = now_ms;
                device.last_seen_ms = now_ms;
                let index = inner.results.devices.len();
                if !device.mac.is_empty() {
                    inner.mac_index.insert(device.mac.clone(), index);
                }
                inner.results.devices.push(device.clone());
                device
            }
        };
        inner.status.devices_found = inner.results.devices.len() as u64;
        Some(merged)
    })
}

/// Match rules, strongest first: DeviceID, then normalized MAC, then IP.
/// The IP rule only applies while at least one side has no MAC yet: an
/// interim IP-identified record may later gain its MAC, but two devices
/// that both carry different MACs are never the same box.
fn matches(existing: &DiscoveredDevice, incoming: &DiscoveredDevice) -> bool {
    if !existing.device_id.is_empty() && existing.device_id == incoming.device_id {
        return true;
    }
    if !existing.mac.is_empty() && existing.mac == incoming.mac {
        return true;
    }
    if !existing.ip.is_empty()
        && existing.ip == incoming.ip
        && (existing.mac.is_empty() || incoming.mac.is_empty())
    {
        return true;
    }
    false
}

/// Overwrite every attribute the new record supplies non-empty, except
/// the primary IP (differing IPs accumulate as alternates instead).
/// Metadata merges with new-wins semantics.
fn merge_into(existing: &mut DiscoveredDevice, incoming: &DiscoveredDevice) {
    if existing.ip.is_empty() && !incoming.ip.is_empty() {
        existing.ip = incoming.ip.clone();
    }
    if !incoming.device_id.is_empty() {
        existing.device_id = incoming.device_id.clone();
    }
    if !incoming.mac.is_empty() {
        existing.mac = incoming.mac.clone();
    }
    if !incoming.hostname.is_empty() {
        existing.hostname = incoming.hostname.clone();
    }
    if !incoming.sys_descr.is_empty() {
        existing.sys_descr = incoming.sys_descr.clone();
    }
    if !incoming.sys_object_id.is_empty() {
        existing.sys_object_id = incoming.sys_object_id.clone();
    }
    if !incoming.sys_contact.is_empty() {
        existing.sys_contact = incoming.sys_contact.clone();
    }
    if !incoming.sys_location.is_empty() {
        existing.sys_location = incoming.sys_location.clone();
    }
    if incoming.uptime_seconds != 0 {
        existing.uptime_seconds = incoming.uptime_seconds;
    }
    for (key, value) in &incoming.metadata {
        existing.metadata.insert(key.clone(), value.clone());
    }
}

/// Append interfaces, deriving a DeviceID where missing. Returns the
/// records to publish; empty when the job is terminal.
pub(crate) fn append_interfaces(
    job: &JobHandle,
    interfaces: Vec<DiscoveredInterface>,
) -> Vec<DiscoveredInterface> {
    let agent_id = job.params.agent_id.clone();
    let poller_id = job.params.poller_id.clone();

    job.with_inner(|inner| {
        if inner.status.state.is_terminal() {
            return Vec::new();
        }
        let mut published = Vec::with_capacity(interfaces.len());
        for mut interface in interfaces {
            if interface.device_id.is_empty() {
                interface.device_id = inner
                    .results
                    .devices
                    .iter()
                    .find(|d| !d.ip.is_empty() && d.ip == interface.device_ip)
                    .map(|d| d.device_id.clone())
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| {
                        fallback_device_id(&agent_id, &poller_id, &interface.device_ip)
                    });
            }
            inner.results.interfaces.push(interface.clone());
            published.push(interface);
        }
        inner.status.interfaces_found = inner.results.interfaces.len() as u64;
        published
    })
}

/// Append topology links under the job mutex. The caller publishes the
/// returned copies outside it.
pub(crate) fn append_links(job: &JobHandle, links: Vec<TopologyLink>) -> Vec<TopologyLink> {
    job.with_inner(|inner| {
        if inner.status.state.is_terminal() {
            return Vec::new();
        }
        inner.results.links.extend(links.iter().cloned());
        inner.status.links_found = inner.results.links.len() as u64;
        links
    })
}

/// Record a target as discovered; false when it already was.
pub(crate) fn mark_target_discovered(job: &JobHandle, target: &str) -> bool {
    job.with_inner(|inner| inner.discovered_targets.insert(target.to_string()))
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
