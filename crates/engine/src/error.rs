// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced on the engine's control operations.

use std::time::Duration;
use sweep_core::JobId;
use thiserror::Error;

/// Failure message used when engine shutdown interrupts a running job.
pub const SHUTDOWN_MESSAGE: &str = "engine shutting down";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no seeds provided")]
    NoSeeds,

    /// The active-job map is full.
    #[error("discovery engine at capacity ({0} active jobs)")]
    AtCapacity(usize),

    /// The admission queue is full; all workers are occupied.
    #[error("all discovery workers are busy")]
    WorkersBusy,

    #[error("discovery engine is shutting down")]
    ShuttingDown,

    #[error("discovery job not found: {0}")]
    JobNotFound(JobId),

    #[error("discovery job still active: {0}")]
    JobStillActive(JobId),

    #[error("discovery job not completed: {0}")]
    JobNotCompleted(JobId),

    #[error("discovery job not active: {0}")]
    JobNotActive(JobId),

    #[error("no cached discovery results")]
    NoCachedResults,

    #[error("engine did not stop within {0:?}")]
    StopTimeout(Duration),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
