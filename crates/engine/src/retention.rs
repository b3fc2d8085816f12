// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic eviction of completed jobs past the retention window.

use crate::engine::EngineInner;
use std::sync::Arc;
use sweep_core::Clock;
use tracing::{debug, info};

/// Tick at half the retention window; evict completed entries whose end
/// time is older than `now - retention`. Active jobs are never touched.
pub(crate) async fn retention_loop<C: Clock>(inner: Arc<EngineInner<C>>) {
    let retention = inner.config.result_retention;
    let period = (retention / 2).max(std::time::Duration::from_millis(100));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // interval fires immediately; skip the startup tick.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = inner.done.cancelled() => {
                debug!("retention cleaner stopped");
                return;
            }
            _ = ticker.tick() => {
                let cutoff = inner
                    .clock
                    .epoch_ms()
                    .saturating_sub(retention.as_millis() as u64);
                let mut table = inner.jobs.write();
                let before = table.completed.len();
                table
                    .completed
                    .retain(|_, completed| completed.status.end_ms >= cutoff);
                let evicted = before - table.completed.len();
                if evicted > 0 {
                    info!(evicted, retained = table.completed.len(),
                        "evicted completed discovery jobs");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
