// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sweep-core: domain types for the sweep network discovery engine

pub mod macros;

pub mod clock;
pub mod cred;
pub mod device;
pub mod duration;
pub mod id;
pub mod job;

pub use clock::{Clock, FakeClock, SystemClock};
pub use cred::{JobCredentials, SnmpCredentials, SnmpVersion};
#[cfg(any(test, feature = "test-support"))]
pub use device::DiscoveredDeviceBuilder;
pub use device::{
    alternate_ip_key, device_id, fallback_device_id, normalize_mac, DiscoveredDevice,
    DiscoveredInterface, LinkProtocol, TopologyLink,
};
pub use duration::{format_duration, parse_duration};
pub use id::short;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobParamsBuilder;
pub use job::{
    DiscoveryType, JobId, JobParams, JobResults, JobState, JobStatus, ParseDiscoveryTypeError,
};
