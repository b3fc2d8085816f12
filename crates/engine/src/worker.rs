// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed-size worker pool consuming the admission queue.

use crate::engine::{CompletedJob, EngineInner};
use crate::job::JobHandle;
use crate::runner;
use std::sync::Arc;
use sweep_core::{Clock, JobState};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Status error set when a job completes without finding any device.
pub const NO_DEVICES_MESSAGE: &str = "No SNMP devices found";

/// One pool worker: pull a job, run the two-phase pipeline, finalize.
/// Exits on engine shutdown or a closed queue.
pub(crate) async fn worker_loop<C: Clock + 'static>(
    inner: Arc<EngineInner<C>>,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<Arc<JobHandle>>>>,
    worker_id: usize,
) {
    loop {
        let job = {
            let mut queue = queue.lock().await;
            tokio::select! {
                _ = inner.done.cancelled() => None,
                job = queue.recv() => job,
            }
        };
        let Some(job) = job else { break };

        info!(worker_id, job = %job.id, seeds = job.params.seeds.len(), "discovery job started");
        job.mark_running();
        runner::run(&inner, &job).await;
        finalize(&inner, &job);
    }
    debug!(worker_id, "discovery worker stopped");
}

/// Promote a finished job into the completed map. A cancellation that
/// already moved the job wins; nothing further happens here.
fn finalize<C: Clock>(inner: &EngineInner<C>, job: &Arc<JobHandle>) {
    let now = inner.clock.epoch_ms();
    let mut table = inner.jobs.write();
    if !table.active.contains_key(&job.id) {
        debug!(job = %job.id, "job already moved by cancellation");
        return;
    }

    if job.state() == JobState::Running {
        if job.status_snapshot().devices_found == 0 {
            job.set_error(NO_DEVICES_MESSAGE);
        }
        job.complete(now);
    }

    let (status, results) = job.snapshot_both();
    let state = status.state;
    let devices = status.devices_found;
    table.active.remove(&job.id);
    table.completed.insert(job.id, CompletedJob { status, results });

    match state {
        JobState::Completed => {
            info!(job = %job.id, devices, "discovery job completed")
        }
        other => warn!(job = %job.id, state = %other, "discovery job finished"),
    }
}
