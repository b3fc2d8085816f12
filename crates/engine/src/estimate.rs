// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rough duration estimate returned on job admission.

use crate::config::DEFAULT_CONCURRENCY;
use sweep_core::DiscoveryType;

/// Assumed devices discovered per seed.
const DEVICES_PER_SEED: usize = 10;

/// Seconds per device by discovery mode.
fn time_per_device(discovery_type: DiscoveryType) -> f64 {
    match discovery_type {
        DiscoveryType::Full => 10.0,
        DiscoveryType::Basic => 2.0,
        DiscoveryType::Interfaces | DiscoveryType::Topology => 5.0,
    }
}

/// Estimated wall-clock seconds for a job:
/// `((seeds × 10 × tpd) / concurrency) × 1.2`, truncated, clamped to
/// the i32 range.
pub fn estimated_duration_seconds(
    seed_count: usize,
    discovery_type: DiscoveryType,
    concurrency: usize,
) -> i32 {
    let estimated_devices = seed_count as f64 * DEVICES_PER_SEED as f64;
    let concurrency = if concurrency == 0 { DEFAULT_CONCURRENCY } else { concurrency };
    let total = (estimated_devices * time_per_device(discovery_type)) / concurrency as f64 * 1.2;
    total.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "estimate_tests.rs"]
mod tests;
