// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sweep-unifi: UniFi controller REST client and payload types.

pub mod client;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{HttpUnifiClient, UnifiApi, UnifiError};
pub use types::{
    ConnectedDevice, ControllerConfig, DeviceDetails, InterfacesField, LldpEntry, Port, Site,
    SwitchPort, UnifiDevice, Uplink,
};
