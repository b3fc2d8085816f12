// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase 1: seed expansion and UniFi enrichment.
//!
//! Enrichment is best-effort per controller; only the everything-failed,
//! nothing-found case propagates an error. Devices found here seed the
//! Phase-2 SNMP target set, deduplicated by normalized MAC.

use crate::engine::EngineInner;
use crate::error::SHUTDOWN_MESSAGE;
use crate::job::{JobHandle, PROGRESS_INITIAL};
use crate::reconcile;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use sweep_core::{
    device_id, fallback_device_id, normalize_mac, Clock, DiscoveredDevice, LinkProtocol,
    TopologyLink,
};
use sweep_scan::expand_seeds;
use sweep_unifi::{DeviceDetails, InterfacesField, Site, UnifiApi, UnifiDevice};
use tracing::{debug, warn};

pub(crate) const NO_TARGETS_MESSAGE: &str =
    "No valid targets to scan after processing seeds";

/// Accumulator shared across the whole enrichment pass.
struct EnrichState {
    attempts: usize,
    errors: usize,
    devices: usize,
    /// Link de-dup: (local IP, neighbor mgmt addr, protocol, site).
    seen_links: HashSet<(String, String, String, String)>,
    /// Controller device IDs already processed this job.
    processed: HashSet<String>,
}

/// Returns the SNMP target set, `Ok(None)` when the job reached a
/// terminal state in-phase, or `Err` when enrichment failed outright.
pub(crate) async fn run<C: Clock + 'static>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
) -> Result<Option<IndexSet<String>>, String> {
    let expanded = expand_seeds(&job.params.seeds);
    if expanded.is_empty() {
        job.fail(NO_TARGETS_MESSAGE, inner.clock.epoch_ms());
        return Ok(None);
    }
    let mut targets: IndexSet<String> = expanded.into_iter().collect();

    if !inner.collab.unifi.is_empty() {
        let mut state = EnrichState {
            attempts: 0,
            errors: 0,
            devices: 0,
            seen_links: HashSet::new(),
            processed: HashSet::new(),
        };
        for seed in &job.params.seeds {
            if checkpoint(inner, job) {
                return Ok(None);
            }
            enrich_seed(inner, job, seed, &mut state, &mut targets).await;
        }
        if state.attempts > 0 && state.errors == state.attempts && state.devices == 0 {
            return Err("UniFi enrichment failed for every controller".to_string());
        }
    }

    job.advance_progress(PROGRESS_INITIAL);
    Ok(Some(targets))
}

/// Cancellation checkpoint: sets the terminal state and reports true
/// when the job or the engine is going away.
pub(crate) fn checkpoint<C: Clock>(inner: &EngineInner<C>, job: &JobHandle) -> bool {
    if job.is_cancelled() {
        job.mark_canceled(inner.clock.epoch_ms());
        return true;
    }
    if inner.done.is_cancelled() {
        job.fail(SHUTDOWN_MESSAGE, inner.clock.epoch_ms());
        return true;
    }
    false
}

async fn enrich_seed<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    seed: &str,
    state: &mut EnrichState,
    targets: &mut IndexSet<String>,
) {
    for api in &inner.collab.unifi {
        state.attempts += 1;
        match enrich_controller(inner, job, api.as_ref(), state, targets).await {
            Ok(found) => state.devices += found,
            Err(e) => {
                state.errors += 1;
                warn!(seed, controller = api.name(), error = %e, "UniFi enrichment failed");
            }
        }
    }
}

/// A cached listing row, kept for uplink resolution.
struct CachedDevice {
    ip: String,
    name: String,
    mac: String,
    device_id: String,
}

async fn enrich_controller<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    api: &dyn UnifiApi,
    state: &mut EnrichState,
    targets: &mut IndexSet<String>,
) -> Result<usize, String> {
    let sites = cached_sites(job, api).await?;

    let agent_id = inner.agent_id(&job.params);
    let poller_id = inner.poller_id(&job.params);

    // Listing pass first: the uplink table may reference any device of
    // the controller.
    let mut listings: Vec<(Site, Vec<UnifiDevice>)> = Vec::with_capacity(sites.len());
    let mut cache: HashMap<String, CachedDevice> = HashMap::new();
    for site in sites {
        let devices = api
            .devices(&site.id)
            .await
            .map_err(|e| format!("device listing for site {}: {}", site.id, e))?;
        for device in &devices {
            let mac = normalize_mac(&device.mac).unwrap_or_default();
            let id = if mac.is_empty() {
                fallback_device_id(&agent_id, &poller_id, &device.ip)
            } else {
                device_id(&agent_id, &poller_id, &mac).unwrap_or_default()
            };
            cache.insert(
                device.id.clone(),
                CachedDevice {
                    ip: device.ip.clone(),
                    name: device.name.clone(),
                    mac,
                    device_id: id,
                },
            );
        }
        listings.push((site, devices));
    }

    let mut found = 0usize;
    for (site, devices) in listings {
        for device in devices {
            if device.ip.is_empty() && device.mac.is_empty() {
                continue;
            }
            if !state.processed.insert(device.id.clone()) {
                continue;
            }
            let detail = match api.device_details(&site.id, &device.id).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    debug!(controller = api.name(), device = device.id, error = %e,
                        "device detail fetch failed");
                    None
                }
            };
            process_device(inner, job, api, &site, &device, detail, state, targets, &cache)
                .await;
            found += 1;
        }
    }
    Ok(found)
}

/// Site list for one controller, cached per base URL inside the job.
pub(crate) async fn cached_sites(
    job: &JobHandle,
    api: &dyn UnifiApi,
) -> Result<Vec<Site>, String> {
    let base_url = api.base_url().to_string();
    if let Some(sites) = job.with_inner(|inner| inner.site_cache.get(&base_url).cloned()) {
        return Ok(sites);
    }
    let sites = api.sites().await.map_err(|e| format!("site listing: {}", e))?;
    if sites.is_empty() {
        return Err(format!("controller {} returned no sites", api.name()));
    }
    job.with_inner(|inner| inner.site_cache.insert(base_url, sites.clone()));
    Ok(sites)
}

#[allow(clippy::too_many_arguments)]
async fn process_device<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    api: &dyn UnifiApi,
    site: &Site,
    device: &UnifiDevice,
    detail: Option<DeviceDetails>,
    state: &mut EnrichState,
    targets: &mut IndexSet<String>,
    cache: &HashMap<String, CachedDevice>,
) {
    let agent_id = inner.agent_id(&job.params);
    let poller_id = inner.poller_id(&job.params);
    let now = inner.clock.epoch_ms();

    let mac = normalize_mac(&device.mac).unwrap_or_default();

    // Phase-2 target selection: the first IP seen for a MAC is its
    // primary and gets polled; later IPs ride along as alternates only.
    if !device.ip.is_empty() {
        let mac_already_known = !mac.is_empty()
            && job.with_inner(|inner| inner.mac_index.contains_key(&mac));
        if !mac_already_known {
            targets.insert(device.ip.clone());
        }
    }

    let record_id = if mac.is_empty() {
        fallback_device_id(&agent_id, &poller_id, &device.ip)
    } else {
        device_id(&agent_id, &poller_id, &mac).unwrap_or_default()
    };

    let mut record = DiscoveredDevice {
        device_id: record_id.clone(),
        ip: device.ip.clone(),
        mac,
        hostname: device.name.clone(),
        ..Default::default()
    };
    record.metadata.insert("source".to_string(), "unifi-api".to_string());
    record.metadata.insert("unifi_controller".to_string(), api.name().to_string());
    record.metadata.insert("unifi_site".to_string(), site.id.clone());
    record.metadata.insert("unifi_device_id".to_string(), device.id.clone());
    if !device.model.is_empty() {
        record.metadata.insert("model".to_string(), device.model.clone());
    }

    if let Some(merged) = reconcile::merge_device(job, record, now) {
        publish_device(inner, &merged).await;
    }

    let Some(detail) = detail else { return };

    // Interfaces are appended to results and published synchronously.
    if let InterfacesField::Ports(ports) = InterfacesField::parse(&detail.interfaces) {
        let interfaces: Vec<_> =
            ports.iter().map(|port| port.to_interface(&device.ip, &record_id)).collect();
        for interface in reconcile::append_interfaces(job, interfaces) {
            publish_interface(inner, &interface).await;
        }
    }

    let mut links = Vec::new();
    for entry in &detail.lldp_table {
        let mut link = TopologyLink::new(LinkProtocol::Lldp, device.ip.clone());
        link.local_device_id = record_id.clone();
        link.local_if_index = entry.local_port_idx;
        link.local_if_name = entry.local_port_name.clone();
        link.neighbor_chassis_id = entry.chassis_id.clone();
        link.neighbor_port_id = entry.port_id.clone();
        link.neighbor_port_descr = entry.port_descr.clone();
        link.neighbor_system_name = entry.system_name.clone();
        link.neighbor_mgmt_addr = entry.mgmt_addr.clone();
        links.push(link);
    }
    for port in &detail.port_table {
        let Some(connected) = &port.connected_device else { continue };
        let mut link = TopologyLink::new(LinkProtocol::UnifiApi, device.ip.clone());
        link.local_device_id = record_id.clone();
        link.local_if_index = port.idx;
        link.local_if_name = port.name.clone();
        link.neighbor_chassis_id = normalize_mac(&connected.mac).unwrap_or_default();
        link.neighbor_system_name = connected.name.clone();
        link.neighbor_mgmt_addr = connected.ip.clone();
        links.push(link);
    }
    if let Some(uplink) = &detail.uplink {
        if let Some(upstream) = cache.get(&uplink.device_id) {
            let mut link = TopologyLink::new(LinkProtocol::UnifiApi, upstream.ip.clone());
            link.local_device_id = upstream.device_id.clone();
            link.neighbor_chassis_id = upstream.mac.clone();
            link.neighbor_system_name = device.name.clone();
            link.neighbor_mgmt_addr = device.ip.clone();
            link.metadata.insert("uplink_of".to_string(), upstream.name.clone());
            links.push(link);
        }
    }

    links.retain(|link| {
        state.seen_links.insert((
            link.local_device_ip.clone(),
            link.neighbor_mgmt_addr.clone(),
            link.protocol.to_string(),
            site.id.clone(),
        ))
    });
    for link in reconcile::append_links(job, links) {
        publish_link(inner, &link).await;
    }
}

/// Phase-2 per-target enrichment: links only, filtered to one IP, all
/// tagged `UniFi-API`. Errors are logged and swallowed.
pub(crate) async fn enrich_target_topology<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    target: &str,
) {
    let agent_id = inner.agent_id(&job.params);
    let poller_id = inner.poller_id(&job.params);

    for api in &inner.collab.unifi {
        let sites = match cached_sites(job, api.as_ref()).await {
            Ok(sites) => sites,
            Err(e) => {
                debug!(target, controller = api.name(), error = %e, "site lookup failed");
                continue;
            }
        };
        for site in sites {
            let devices = match api.devices(&site.id).await {
                Ok(devices) => devices,
                Err(e) => {
                    debug!(target, controller = api.name(), error = %e, "device listing failed");
                    continue;
                }
            };
            for device in devices {
                // Filtered pass: only the target's own row, and only
                // switching devices carry useful port topology.
                if device.ip != target || !device.is_switch() {
                    continue;
                }
                let detail = match api.device_details(&site.id, &device.id).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        debug!(target, device = device.id, error = %e, "detail fetch failed");
                        continue;
                    }
                };
                let mac = normalize_mac(&device.mac).unwrap_or_default();
                let local_id = if mac.is_empty() {
                    fallback_device_id(&agent_id, &poller_id, &device.ip)
                } else {
                    device_id(&agent_id, &poller_id, &mac).unwrap_or_default()
                };

                let mut links = Vec::new();
                for entry in &detail.lldp_table {
                    let mut link = TopologyLink::new(LinkProtocol::UnifiApi, device.ip.clone());
                    link.local_device_id = local_id.clone();
                    link.local_if_index = entry.local_port_idx;
                    link.local_if_name = entry.local_port_name.clone();
                    link.neighbor_chassis_id = entry.chassis_id.clone();
                    link.neighbor_port_id = entry.port_id.clone();
                    link.neighbor_port_descr = entry.port_descr.clone();
                    link.neighbor_system_name = entry.system_name.clone();
                    link.neighbor_mgmt_addr = entry.mgmt_addr.clone();
                    links.push(link);
                }
                for port in &detail.port_table {
                    let Some(connected) = &port.connected_device else { continue };
                    let mut link = TopologyLink::new(LinkProtocol::UnifiApi, device.ip.clone());
                    link.local_device_id = local_id.clone();
                    link.local_if_index = port.idx;
                    link.local_if_name = port.name.clone();
                    link.neighbor_chassis_id =
                        normalize_mac(&connected.mac).unwrap_or_default();
                    link.neighbor_system_name = connected.name.clone();
                    link.neighbor_mgmt_addr = connected.ip.clone();
                    links.push(link);
                }
                for link in reconcile::append_links(job, links) {
                    publish_link(inner, &link).await;
                }
            }
        }
    }
}

pub(crate) async fn publish_device<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    device: &DiscoveredDevice,
) {
    if let Err(e) = inner.collab.publisher.publish_device(device).await {
        warn!(device = device.device_id, error = %e, "device publish failed");
    }
}

pub(crate) async fn publish_interface<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    interface: &sweep_core::DiscoveredInterface,
) {
    if let Err(e) = inner.collab.publisher.publish_interface(interface).await {
        warn!(
            device = interface.device_ip,
            if_index = interface.if_index,
            error = %e,
            "interface publish failed"
        );
    }
}

pub(crate) async fn publish_link<C: Clock>(inner: &Arc<EngineInner<C>>, link: &TopologyLink) {
    if let Err(e) = inner.collab.publisher.publish_link(link).await {
        warn!(device = link.local_device_ip, error = %e, "topology link publish failed");
    }
}

#[cfg(test)]
#[path = "phase1_tests.rs"]
mod tests;
