// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Buffered sampler: a background collector feeding a ring buffer that
//! slow readers consume at their own pace.
//!
//! The contract every reimplementation must keep: start-once,
//! clone-on-write, clone-on-read, retention-based staleness, and clean
//! shutdown when the parent context cancels.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sweep_core::Clock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Produces one snapshot per tick.
#[async_trait]
pub trait SampleCollector<T>: Send + Sync {
    async fn collect(&self) -> Result<T, String>;
}

struct SamplerInner<T, C: Clock> {
    collector: Arc<dyn SampleCollector<T>>,
    interval: Duration,
    retention: Duration,
    tick_timeout: Duration,
    clock: C,
    capacity: usize,
    buf: Mutex<VecDeque<(T, Instant)>>,
    started: AtomicBool,
}

/// Ring buffer of `(snapshot, collected_at)` entries sized to
/// `ceil(retention / interval) + 1`.
pub struct BufferedSampler<T, C: Clock = sweep_core::SystemClock> {
    inner: Arc<SamplerInner<T, C>>,
}

impl<T, C: Clock> Clone for BufferedSampler<T, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T, C> BufferedSampler<T, C>
where
    T: Clone + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(
        collector: Arc<dyn SampleCollector<T>>,
        interval: Duration,
        retention: Duration,
        clock: C,
    ) -> Self {
        let capacity = retention.as_nanos().div_ceil(interval.as_nanos().max(1)) as usize + 1;
        Self {
            inner: Arc::new(SamplerInner {
                collector,
                interval,
                retention,
                // Default per-tick deadline is the sampling interval.
                tick_timeout: interval,
                clock,
                capacity,
                buf: Mutex::new(VecDeque::with_capacity(capacity)),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Launch the background collector. Subsequent calls are no-ops; the
    /// task stops when `parent` cancels.
    pub fn start(&self, parent: &CancellationToken) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let token = parent.child_token();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("sampler stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        match tokio::time::timeout(inner.tick_timeout, inner.collector.collect())
                            .await
                        {
                            Ok(Ok(snapshot)) => record_inner(&inner, &snapshot),
                            Ok(Err(e)) => warn!(error = %e, "sample collection failed"),
                            Err(_) => warn!("sample collection timed out"),
                        }
                    }
                }
            }
        });
    }

    /// Store a clone of `snapshot` stamped with the current time.
    pub fn record(&self, snapshot: &T) {
        record_inner(&self.inner, snapshot);
    }

    /// Clone of the newest entry, unless it has aged past retention.
    pub fn latest(&self) -> Option<T> {
        let buf = self.inner.buf.lock();
        let (snapshot, collected_at) = buf.back()?;
        let age = self.inner.clock.now().saturating_duration_since(*collected_at);
        if age > self.inner.retention {
            return None;
        }
        Some(snapshot.clone())
    }

    /// Number of buffered entries, stale or not.
    pub fn len(&self) -> usize {
        self.inner.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.buf.lock().is_empty()
    }
}

fn record_inner<T: Clone, C: Clock>(inner: &SamplerInner<T, C>, snapshot: &T) {
    let mut buf = inner.buf.lock();
    if buf.len() == inner.capacity {
        buf.pop_front();
    }
    buf.push_back((snapshot.clone(), inner.clock.now()));
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
