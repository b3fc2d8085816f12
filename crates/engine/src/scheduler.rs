// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer-driven resubmission of configured discovery jobs.
//!
//! Submissions are best-effort: a rejected tick (capacity, busy
//! workers) is dropped with a log line and the ticker keeps going.

use crate::config::ScheduledJobConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use std::str::FromStr;
use std::time::Duration;
use sweep_core::duration::parse_duration;
use sweep_core::{Clock, DiscoveryType, JobParams};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One ticker task per enabled scheduled job. Entries with unparseable
/// intervals or types are logged and skipped.
pub(crate) fn spawn_schedulers<C: Clock + 'static>(engine: &Engine<C>) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();
    for schedule in &engine.inner.config.scheduled_jobs {
        if !schedule.enabled {
            continue;
        }
        let interval = match parse_duration(&schedule.interval) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(job = schedule.name, interval = schedule.interval, error = %e,
                    "skipping scheduled job: bad interval");
                continue;
            }
        };
        let Some(params) = build_params(schedule) else { continue };

        let engine = engine.clone();
        let name = schedule.name.clone();
        tasks.push(tokio::spawn(run_schedule(engine, name, interval, params)));
    }
    tasks
}

/// Map one config entry to job parameters; `None` skips the entry.
fn build_params(schedule: &ScheduledJobConfig) -> Option<JobParams> {
    let discovery_type = match DiscoveryType::from_str(&schedule.job_type) {
        Ok(discovery_type) => discovery_type,
        Err(e) => {
            warn!(job = schedule.name, error = %e, "skipping scheduled job: bad type");
            return None;
        }
    };
    let timeout = if schedule.timeout.is_empty() {
        None
    } else {
        match parse_duration(&schedule.timeout) {
            Ok(timeout) => Some(timeout),
            Err(e) => {
                warn!(job = schedule.name, timeout = schedule.timeout, error = %e,
                    "skipping scheduled job: bad timeout");
                return None;
            }
        }
    };

    let mut params = JobParams::new(schedule.seeds.clone(), discovery_type)
        .concurrency(schedule.concurrency)
        .retries(schedule.retries)
        .options(schedule.options.clone());
    params.credentials = schedule.credentials.clone();
    params.timeout = timeout;
    Some(params)
}

/// Submit immediately, then on every interval tick until shutdown.
async fn run_schedule<C: Clock + 'static>(
    engine: Engine<C>,
    name: String,
    interval: Duration,
    params: JobParams,
) {
    info!(job = name, interval = ?interval, "scheduled discovery job armed");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = engine.inner.done.cancelled() => {
                debug!(job = name, "scheduler stopped");
                return;
            }
            // The first tick fires immediately: the initial submission.
            _ = ticker.tick() => submit(&engine, &name, params.clone()),
        }
    }
}

fn submit<C: Clock + 'static>(engine: &Engine<C>, name: &str, params: JobParams) {
    match engine.start_discovery(params) {
        Ok(id) => info!(job = name, discovery = %id, "scheduled discovery submitted"),
        Err(EngineError::ShuttingDown) => {}
        Err(e) => debug!(job = name, error = %e, "scheduled discovery tick dropped"),
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
