// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase 2: fan the SNMP target set out across a per-job prober pool.
//!
//! Shape: fan-out to N workers, close input, await all, close output,
//! check cancel. Every blocking point selects against both the job and
//! the engine cancellation tokens.

use crate::config::DEFAULT_CONCURRENCY;
use crate::engine::EngineInner;
use crate::error::SHUTDOWN_MESSAGE;
use crate::job::{JobHandle, BASE_SNMP_PROGRESS, PROGRESS_SCANNING};
use crate::{phase1, reconcile};
use indexmap::IndexSet;
use std::sync::Arc;
use sweep_core::Clock;
use sweep_scan::ProbeConfig;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) async fn run<C: Clock + 'static>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    targets: IndexSet<String>,
) {
    // The job's stored scan queue, fixed here, is what the feeder
    // drains.
    let scan_queue: Vec<String> = job.with_inner(|state| {
        state.scan_queue = targets.into_iter().collect();
        state.scan_queue.clone()
    });
    let total = scan_queue.len();
    if total == 0 {
        // Success with zero devices; the finalizer pins the state.
        debug!(job = %job.id, "no SNMP targets to poll");
        return;
    }

    let hint = if job.params.concurrency == 0 {
        DEFAULT_CONCURRENCY
    } else {
        job.params.concurrency
    };
    let concurrency = hint.min(total);
    info!(job = %job.id, targets = total, concurrency, "starting SNMP polling");

    let probe_config = Arc::new(ProbeConfig {
        discovery_type: job.params.discovery_type,
        credentials: inner.config.job_credentials(job.params.credentials.as_ref()),
        timeout: job.params.timeout.unwrap_or(inner.config.timeout),
        retries: if job.params.retries > 0 { job.params.retries } else { inner.config.retries },
        agent_id: inner.agent_id(&job.params),
        poller_id: inner.poller_id(&job.params),
        extra_oids: inner.config.extra_oids(&job.params.discovery_type.to_string()),
    });

    let (target_tx, target_rx) = mpsc::channel::<String>(2 * concurrency);
    let (result_tx, mut result_rx) = mpsc::channel::<bool>(2 * concurrency);
    let target_rx = Arc::new(tokio::sync::Mutex::new(target_rx));

    // Progress tracker: one update per probed target, bounded to the
    // scanning envelope. Stops adjusting once cancellation fires.
    let tracker = {
        let inner = Arc::clone(inner);
        let job = Arc::clone(job);
        tokio::spawn(async move {
            let mut probed = 0usize;
            let mut reachable = 0usize;
            while let Some(ok) = result_rx.recv().await {
                probed += 1;
                if ok {
                    reachable += 1;
                }
                if job.is_cancelled() || inner.done.is_cancelled() {
                    continue;
                }
                let fraction = probed as f64 / total as f64;
                job.advance_progress(
                    BASE_SNMP_PROGRESS + fraction * (PROGRESS_SCANNING - BASE_SNMP_PROGRESS),
                );
            }
            (probed, reachable)
        })
    };

    let mut probers = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let inner = Arc::clone(inner);
        let job = Arc::clone(job);
        let target_rx = Arc::clone(&target_rx);
        let result_tx = result_tx.clone();
        let probe_config = Arc::clone(&probe_config);
        probers.push(tokio::spawn(async move {
            loop {
                let target = {
                    let mut target_rx = target_rx.lock().await;
                    tokio::select! {
                        _ = job.cancel_token().cancelled() => None,
                        _ = inner.done.cancelled() => None,
                        target = target_rx.recv() => target,
                    }
                };
                let Some(target) = target else { break };
                // Cancellation abandons the in-flight probe; no state
                // mutation happens after a terminal transition.
                let ok = tokio::select! {
                    _ = job.cancel_token().cancelled() => false,
                    _ = inner.done.cancelled() => false,
                    ok = probe_target(&inner, &job, &target, &probe_config) => ok,
                };
                if result_tx.send(ok).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    // Feed, close input, await workers, close output.
    let mut interrupted = false;
    for target in scan_queue {
        tokio::select! {
            _ = job.cancel_token().cancelled() => { interrupted = true; break; }
            _ = inner.done.cancelled() => { interrupted = true; break; }
            sent = target_tx.send(target) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    if interrupted {
        debug!(job = %job.id, "canceled during SNMP polling");
    }
    drop(target_tx);

    for prober in probers {
        let _ = prober.await;
    }
    let (probed, reachable) = tracker.await.unwrap_or((0, 0));
    info!(job = %job.id, probed, reachable, "SNMP polling finished");

    // Final cancellation re-check; an untouched job is handed to the
    // finalizer still running.
    let now = inner.clock.epoch_ms();
    if job.is_cancelled() {
        job.mark_canceled(now);
    } else if inner.done.is_cancelled() {
        job.fail(SHUTDOWN_MESSAGE, now);
    }
}

/// Probe one target and fold its report into the job. Returns whether
/// the target produced a device.
async fn probe_target<C: Clock>(
    inner: &Arc<EngineInner<C>>,
    job: &Arc<JobHandle>,
    target: &str,
    probe_config: &Arc<ProbeConfig>,
) -> bool {
    if !reconcile::mark_target_discovered(job, target) {
        warn!(job = %job.id, target, "target already discovered, skipping");
        return false;
    }

    if !inner.collab.unifi.is_empty() && job.params.discovery_type.wants_topology() {
        phase1::enrich_target_topology(inner, job, target).await;
    }

    match inner.prober.probe(target, probe_config).await {
        Ok(Some(report)) => {
            let now = inner.clock.epoch_ms();
            if let Some(device) = reconcile::merge_device(job, report.device, now) {
                phase1::publish_device(inner, &device).await;
            }
            for interface in reconcile::append_interfaces(job, report.interfaces) {
                phase1::publish_interface(inner, &interface).await;
            }
            for link in reconcile::append_links(job, report.links) {
                phase1::publish_link(inner, &link).await;
            }
            job.with_inner(|state| {
                if !state.status.state.is_terminal() {
                    state.results.raw.insert(report.target.clone(), report.raw);
                }
            });
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!(job = %job.id, target, error = %e, "target probe failed");
            false
        }
    }
}
