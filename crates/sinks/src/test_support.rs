// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture sink for engine tests.

use crate::{PublishError, Publisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use sweep_core::{DiscoveredDevice, DiscoveredInterface, TopologyLink};

/// A record as seen by the sink.
#[derive(Debug, Clone)]
pub enum Published {
    Device(DiscoveredDevice),
    Interface(DiscoveredInterface),
    Link(TopologyLink),
}

/// Publisher double that records everything in memory; can be told to
/// reject every write.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Published>>,
    reject: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self { records: Mutex::new(Vec::new()), reject: true }
    }

    pub fn records(&self) -> Vec<Published> {
        self.records.lock().clone()
    }

    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                Published::Device(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn interfaces(&self) -> Vec<DiscoveredInterface> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                Published::Interface(i) => Some(i.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn links(&self) -> Vec<TopologyLink> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                Published::Link(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, record: Published) -> Result<(), PublishError> {
        if self.reject {
            return Err(PublishError::Rejected("recording sink set to reject".to_string()));
        }
        self.records.lock().push(record);
        Ok(())
    }
}

#[async_trait]
impl Publisher for RecordingSink {
    async fn publish_device(&self, device: &DiscoveredDevice) -> Result<(), PublishError> {
        self.push(Published::Device(device.clone()))
    }

    async fn publish_interface(
        &self,
        interface: &DiscoveredInterface,
    ) -> Result<(), PublishError> {
        self.push(Published::Interface(interface.clone()))
    }

    async fn publish_link(&self, link: &TopologyLink) -> Result<(), PublishError> {
        self.push(Published::Link(link.clone()))
    }
}
