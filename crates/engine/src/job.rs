// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job runtime state: cancellable context, progress accounting, and
//! the terminal-state guard.
//!
//! Lock order when both are needed is Controller → Job; nothing in this
//! module takes the controller lock.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use sweep_core::{JobId, JobParams, JobResults, JobState, JobStatus};
use sweep_unifi::Site;
use tokio_util::sync::CancellationToken;

/// Progress set when a worker picks the job up.
pub const PROGRESS_RUNNING: f64 = 5.0;
/// Progress once Phase 1 (seed expansion + enrichment) is done.
pub const PROGRESS_INITIAL: f64 = 10.0;
/// Lower edge of the Phase-2 progress envelope.
pub const BASE_SNMP_PROGRESS: f64 = PROGRESS_INITIAL / 3.0;
/// Upper edge of the Phase-2 progress envelope.
pub const PROGRESS_SCANNING: f64 = 90.0;
/// Terminal progress.
pub const PROGRESS_DONE: f64 = 100.0;

/// Mutable half of a job, guarded by the job mutex.
pub(crate) struct JobInner {
    pub status: JobStatus,
    pub results: JobResults,
    /// Targets that already produced a device this job; probers skip
    /// them.
    pub discovered_targets: HashSet<String>,
    /// Normalized MAC → index into `results.devices`.
    pub mac_index: HashMap<String, usize>,
    /// Phase-2 target list, fixed at Phase-2 entry.
    pub scan_queue: Vec<String>,
    /// Per-job UniFi site cache, keyed by controller base URL.
    pub site_cache: HashMap<String, Vec<Site>>,
}

/// A discovery job: immutable params, a detached cancellation handle,
/// and mutex-guarded status/results.
pub struct JobHandle {
    pub id: JobId,
    pub params: JobParams,
    cancel: CancellationToken,
    inner: Mutex<JobInner>,
}

impl JobHandle {
    /// Build a pending job. The cancellation token is detached: the
    /// admission caller's lifetime has no bearing on the job's.
    pub fn new(id: JobId, params: JobParams, now_ms: u64) -> Self {
        Self {
            id,
            params,
            cancel: CancellationToken::new(),
            inner: Mutex::new(JobInner {
                status: JobStatus {
                    state: JobState::Pending,
                    start_ms: now_ms,
                    ..Default::default()
                },
                results: JobResults::default(),
                discovered_targets: HashSet::new(),
                mac_index: HashMap::new(),
                scan_queue: Vec::new(),
                site_cache: HashMap::new(),
            }),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the job's context. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().status.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Copy of the current status.
    pub fn status_snapshot(&self) -> JobStatus {
        self.inner.lock().status.clone()
    }

    /// Copy of the current results.
    pub fn results_snapshot(&self) -> JobResults {
        self.inner.lock().results.clone()
    }

    pub(crate) fn with_inner<T>(&self, f: impl FnOnce(&mut JobInner) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Pending → Running, pinning progress to the running floor.
    pub fn mark_running(&self) {
        let mut inner = self.inner.lock();
        if inner.status.state == JobState::Pending {
            inner.status.state = JobState::Running;
            inner.status.progress = inner.status.progress.max(PROGRESS_RUNNING);
        }
    }

    /// Raise progress; never lowers it, never touches terminal jobs.
    pub fn advance_progress(&self, progress: f64) {
        let mut inner = self.inner.lock();
        if !inner.status.state.is_terminal() {
            inner.status.progress = inner.status.progress.max(progress.min(PROGRESS_DONE));
        }
    }

    /// Record a non-fatal error message without changing state.
    pub fn set_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        if !inner.status.state.is_terminal() {
            inner.status.error = Some(message.into());
        }
    }

    fn finish(inner: &mut JobInner, state: JobState, error: Option<String>, now_ms: u64) -> bool {
        if inner.status.state.is_terminal() {
            return false;
        }
        inner.status.state = state;
        if error.is_some() {
            inner.status.error = error;
        }
        inner.status.end_ms = now_ms;
        inner.status.progress = PROGRESS_DONE;
        true
    }

    /// Transition to `Completed`. No-op on already-terminal jobs.
    pub fn complete(&self, now_ms: u64) -> bool {
        let mut inner = self.inner.lock();
        Self::finish(&mut inner, JobState::Completed, None, now_ms)
    }

    /// Transition to `Failed` with a message. No-op on terminal jobs.
    pub fn fail(&self, message: impl Into<String>, now_ms: u64) -> bool {
        let mut inner = self.inner.lock();
        Self::finish(&mut inner, JobState::Failed, Some(message.into()), now_ms)
    }

    /// Transition to `Canceled`. No-op on terminal jobs.
    pub fn mark_canceled(&self, now_ms: u64) -> bool {
        let mut inner = self.inner.lock();
        Self::finish(&mut inner, JobState::Canceled, None, now_ms)
    }

    /// Status + results in one lock acquisition, for the map move.
    pub fn snapshot_both(&self) -> (JobStatus, JobResults) {
        let inner = self.inner.lock();
        (inner.status.clone(), inner.results.clone())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
