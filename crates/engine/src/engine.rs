// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine controller: admission, lookup, cancellation, lifecycle.
//!
//! The two job maps and the admission queue are the only shared state;
//! everything else hangs off individual jobs. Lock order is always
//! Controller → Job.

use crate::config::EngineConfig;
use crate::error::{EngineError, SHUTDOWN_MESSAGE};
use crate::job::JobHandle;
use crate::{retention, scheduler, worker};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{Clock, JobId, JobParams, JobResults, JobStatus, SystemClock};
use sweep_scan::{Pinger, SnmpClientFactory, TargetProber};
use sweep_sinks::Publisher;
use sweep_unifi::UnifiApi;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hard ceiling on how long `stop` waits for goroutine drain.
pub const STOP_FALLBACK: Duration = Duration::from_secs(10);

/// External collaborators, injected as trait objects.
pub struct Collaborators {
    pub pinger: Arc<dyn Pinger>,
    pub snmp: Arc<dyn SnmpClientFactory>,
    pub unifi: Vec<Arc<dyn UnifiApi>>,
    pub publisher: Arc<dyn Publisher>,
}

/// A terminal job retained for result queries until eviction.
pub(crate) struct CompletedJob {
    pub status: JobStatus,
    pub results: JobResults,
}

/// Snapshot returned by the result queries.
#[derive(Debug, Clone)]
pub struct DiscoveryResults {
    pub job_id: JobId,
    pub status: JobStatus,
    pub results: JobResults,
}

pub(crate) struct JobTable {
    pub active: HashMap<JobId, Arc<JobHandle>>,
    pub completed: HashMap<JobId, CompletedJob>,
}

pub(crate) struct EngineInner<C: Clock> {
    pub(crate) config: EngineConfig,
    pub(crate) clock: C,
    pub(crate) collab: Collaborators,
    pub(crate) prober: TargetProber,
    pub(crate) jobs: RwLock<JobTable>,
    queue_tx: Mutex<Option<mpsc::Sender<Arc<JobHandle>>>>,
    queue_rx: Mutex<Option<mpsc::Receiver<Arc<JobHandle>>>>,
    pub(crate) done: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Clock> EngineInner<C> {
    /// Agent identity for a job: its own, else the stream defaults.
    pub(crate) fn agent_id(&self, params: &JobParams) -> String {
        if params.agent_id.is_empty() {
            self.config.stream_config.agent_id.clone()
        } else {
            params.agent_id.clone()
        }
    }

    pub(crate) fn poller_id(&self, params: &JobParams) -> String {
        if params.poller_id.is_empty() {
            self.config.stream_config.poller_id.clone()
        } else {
            params.poller_id.clone()
        }
    }
}

/// The discovery engine. Cheap to clone; all state is shared.
pub struct Engine<C: Clock = SystemClock> {
    pub(crate) inner: Arc<EngineInner<C>>,
}

impl<C: Clock> Clone for Engine<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Clock + 'static> Engine<C> {
    /// Validate the config and build an engine. Nothing runs until
    /// [`Engine::start`].
    pub fn new(
        config: EngineConfig,
        collab: Collaborators,
        clock: C,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        let (queue_tx, queue_rx) = mpsc::channel(config.max_active_jobs);
        let prober = TargetProber::new(Arc::clone(&collab.pinger), Arc::clone(&collab.snmp));
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                clock,
                collab,
                prober,
                jobs: RwLock::new(JobTable {
                    active: HashMap::new(),
                    completed: HashMap::new(),
                }),
                queue_tx: Mutex::new(Some(queue_tx)),
                queue_rx: Mutex::new(Some(queue_rx)),
                done: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Spawn the worker pool, the retention cleaner, and the schedulers.
    /// Must be called from within a tokio runtime. Returns once all
    /// tasks are launched.
    pub fn start(&self) {
        let Some(queue_rx) = self.inner.queue_rx.lock().take() else {
            warn!("engine already started");
            return;
        };
        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));

        let mut tasks = Vec::with_capacity(self.inner.config.workers + 1);
        for worker_id in 0..self.inner.config.workers {
            tasks.push(tokio::spawn(worker::worker_loop(
                Arc::clone(&self.inner),
                Arc::clone(&queue_rx),
                worker_id,
            )));
        }
        tasks.push(tokio::spawn(retention::retention_loop(Arc::clone(&self.inner))));
        tasks.extend(scheduler::spawn_schedulers(self));
        info!(
            workers = self.inner.config.workers,
            schedulers = self.inner.config.scheduled_jobs.len(),
            "discovery engine started"
        );
        self.inner.tasks.lock().extend(tasks);
    }

    /// Signal shutdown and wait for every spawned task. Fails with
    /// `StopTimeout` after `min(timeout, 10s)`. Jobs that never reached
    /// a worker transition to failed.
    pub async fn stop(&self, timeout: Duration) -> Result<(), EngineError> {
        info!("stopping discovery engine");
        self.inner.done.cancel();

        let deadline = timeout.min(STOP_FALLBACK);
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.tasks.lock());
        let drain = async {
            for task in tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(deadline, drain).await.is_err() {
            return Err(EngineError::StopTimeout(deadline));
        }

        // Queue close strictly follows worker-pool drain.
        self.inner.queue_tx.lock().take();

        // Jobs still queued at shutdown never ran; fail them so every
        // admitted ID ends up in exactly one map.
        let now = self.inner.clock.epoch_ms();
        let mut table = self.inner.jobs.write();
        let leftovers: Vec<JobId> = table.active.keys().copied().collect();
        for id in leftovers {
            if let Some(handle) = table.active.remove(&id) {
                handle.cancel();
                handle.fail(SHUTDOWN_MESSAGE, now);
                let (status, results) = handle.snapshot_both();
                table.completed.insert(id, CompletedJob { status, results });
            }
        }
        info!("discovery engine stopped");
        Ok(())
    }

    /// Admit a discovery job. Never blocks: the job is either enqueued
    /// or rejected, and a rejected job's context is cancelled before
    /// returning.
    pub fn start_discovery(&self, params: JobParams) -> Result<JobId, EngineError> {
        if params.seeds.is_empty() {
            return Err(EngineError::NoSeeds);
        }
        let id = JobId::new();
        let handle = Arc::new(JobHandle::new(id, params, self.inner.clock.epoch_ms()));

        let mut table = self.inner.jobs.write();
        if self.inner.done.is_cancelled() {
            handle.cancel();
            return Err(EngineError::ShuttingDown);
        }
        if table.active.len() >= self.inner.config.max_active_jobs {
            handle.cancel();
            return Err(EngineError::AtCapacity(table.active.len()));
        }
        let queue_tx = self.inner.queue_tx.lock();
        let Some(tx) = queue_tx.as_ref() else {
            handle.cancel();
            return Err(EngineError::ShuttingDown);
        };
        // The map insert happens only after the enqueue succeeds, so a
        // full queue can never leak a map slot.
        match tx.try_send(Arc::clone(&handle)) {
            Ok(()) => {
                drop(queue_tx);
                table.active.insert(id, handle);
                debug!(job = %id, "discovery job admitted");
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(handle)) => {
                handle.cancel();
                Err(EngineError::WorkersBusy)
            }
            Err(mpsc::error::TrySendError::Closed(handle)) => {
                handle.cancel();
                Err(EngineError::ShuttingDown)
            }
        }
    }

    /// Copy of the status from whichever map holds the job.
    pub fn discovery_status(&self, id: &JobId) -> Result<JobStatus, EngineError> {
        let table = self.inner.jobs.read();
        if let Some(handle) = table.active.get(id) {
            return Ok(handle.status_snapshot());
        }
        table
            .completed
            .get(id)
            .map(|completed| completed.status.clone())
            .ok_or(EngineError::JobNotFound(*id))
    }

    /// Copy of a completed job's results. Active jobs report
    /// `JobStillActive`; unknown or evicted IDs report `JobNotCompleted`.
    pub fn discovery_results(
        &self,
        id: &JobId,
        include_raw: bool,
    ) -> Result<DiscoveryResults, EngineError> {
        let table = self.inner.jobs.read();
        if table.active.contains_key(id) {
            return Err(EngineError::JobStillActive(*id));
        }
        let completed = table.completed.get(id).ok_or(EngineError::JobNotCompleted(*id))?;
        Ok(DiscoveryResults {
            job_id: *id,
            status: completed.status.clone(),
            results: if include_raw {
                completed.results.clone()
            } else {
                completed.results.without_raw()
            },
        })
    }

    /// Cancel an active job: cancel its context, pin status, and move it
    /// to the completed map. Re-cancelling a canceled job is a no-op.
    pub fn cancel_discovery(&self, id: &JobId) -> Result<(), EngineError> {
        let mut table = self.inner.jobs.write();
        if let Some(handle) = table.active.remove(id) {
            handle.cancel();
            handle.mark_canceled(self.inner.clock.epoch_ms());
            let (status, results) = handle.snapshot_both();
            table.completed.insert(*id, CompletedJob { status, results });
            info!(job = %id, "discovery job canceled");
            return Ok(());
        }
        match table.completed.get(id) {
            Some(completed) if completed.status.state == sweep_core::JobState::Canceled => Ok(()),
            _ => Err(EngineError::JobNotActive(*id)),
        }
    }

    /// The completed entry with the greatest non-zero end time.
    pub fn latest_cached_results(
        &self,
        include_raw: bool,
    ) -> Result<DiscoveryResults, EngineError> {
        let table = self.inner.jobs.read();
        let (id, completed) = table
            .completed
            .iter()
            .filter(|(_, c)| c.status.end_ms != 0)
            .max_by_key(|(_, c)| c.status.end_ms)
            .ok_or(EngineError::NoCachedResults)?;
        Ok(DiscoveryResults {
            job_id: *id,
            status: completed.status.clone(),
            results: if include_raw {
                completed.results.clone()
            } else {
                completed.results.without_raw()
            },
        })
    }

    /// IDs of all active (pre-terminal) jobs.
    pub fn active_job_ids(&self) -> Vec<JobId> {
        self.inner.jobs.read().active.keys().copied().collect()
    }

    /// (active, pending, completed) counts for the status surface.
    pub fn job_counts(&self) -> (usize, usize, usize) {
        let table = self.inner.jobs.read();
        let pending = table
            .active
            .values()
            .filter(|handle| handle.state() == sweep_core::JobState::Pending)
            .count();
        (table.active.len(), pending, table.completed.len())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
