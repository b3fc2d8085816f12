// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sweep-sinks: publisher contract and the JSONL stream sink.
//!
//! Delivery is at-least-once; consumers must tolerate duplicates after
//! publisher retries.

pub mod jsonl;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use jsonl::JsonlSink;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sweep_core::duration::duration_str;
use sweep_core::{DiscoveredDevice, DiscoveredInterface, TopologyLink};
use thiserror::Error;

/// Downstream stream naming and publish tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub device_stream: String,
    pub interface_stream: String,
    pub topology_stream: String,
    pub agent_id: String,
    pub poller_id: String,
    pub partition: String,
    pub publish_batch_size: usize,
    pub publish_retries: u32,
    #[serde(with = "duration_str")]
    pub publish_retry_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            device_stream: "devices".to_string(),
            interface_stream: "interfaces".to_string(),
            topology_stream: "topology".to_string(),
            agent_id: String::new(),
            poller_id: String::new(),
            partition: "default".to_string(),
            publish_batch_size: 100,
            publish_retries: 3,
            publish_retry_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("sink rejected record: {0}")]
    Rejected(String),
}

/// Forwarder for reconciled records. Single-record operations are
/// required; batch variants default to record-at-a-time loops.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_device(&self, device: &DiscoveredDevice) -> Result<(), PublishError>;

    async fn publish_interface(
        &self,
        interface: &DiscoveredInterface,
    ) -> Result<(), PublishError>;

    async fn publish_link(&self, link: &TopologyLink) -> Result<(), PublishError>;

    async fn publish_devices(&self, devices: &[DiscoveredDevice]) -> Result<(), PublishError> {
        for device in devices {
            self.publish_device(device).await?;
        }
        Ok(())
    }

    async fn publish_interfaces(
        &self,
        interfaces: &[DiscoveredInterface],
    ) -> Result<(), PublishError> {
        for interface in interfaces {
            self.publish_interface(interface).await?;
        }
        Ok(())
    }

    async fn publish_links(&self, links: &[TopologyLink]) -> Result<(), PublishError> {
        for link in links {
            self.publish_link(link).await?;
        }
        Ok(())
    }
}
