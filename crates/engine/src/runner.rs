// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two-phase pipeline: UniFi enrichment seeds SNMP polling.

use crate::engine::EngineInner;
use crate::job::JobHandle;
use crate::{phase1, phase2};
use std::sync::Arc;
use sweep_core::Clock;

pub(crate) async fn run<C: Clock + 'static>(inner: &Arc<EngineInner<C>>, job: &Arc<JobHandle>) {
    let targets = match phase1::run(inner, job).await {
        Ok(Some(targets)) => targets,
        // Phase 1 already set a terminal state (no seeds, canceled,
        // shutdown).
        Ok(None) => return,
        Err(message) => {
            job.fail(message, inner.clock.epoch_ms());
            return;
        }
    };
    phase2::run(inner, job, targets).await;
}
