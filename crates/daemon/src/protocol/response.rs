// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sweep_core::{DiscoveredDevice, DiscoveredInterface, JobStatus, TopologyLink};

/// Error kinds surfaced on the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoSeeds,
    AtCapacity,
    WorkersBusy,
    ShuttingDown,
    JobNotFound,
    JobStillActive,
    JobNotCompleted,
    JobNotActive,
    InvalidArgument,
    Internal,
}

/// One job's status, flattened for the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatusEntry {
    pub discovery_id: String,
    pub state: String,
    pub progress: f64,
    pub devices_found: u64,
    pub interfaces_found: u64,
    pub links_found: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusEntry {
    pub fn new(discovery_id: impl Into<String>, status: &JobStatus) -> Self {
        Self {
            discovery_id: discovery_id.into(),
            state: status.state.to_string(),
            progress: status.progress,
            devices_found: status.devices_found,
            interfaces_found: status.interfaces_found,
            links_found: status.links_found,
            start_ms: status.start_ms,
            end_ms: status.end_ms,
            error: status.error.clone(),
        }
    }
}

/// Response from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,

    Pong,

    Hello {
        version: String,
        compatible: bool,
    },

    Status {
        available: bool,
        status: String,
        active_ids: Vec<String>,
        pending: usize,
        completed: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job: Option<JobStatusEntry>,
    },

    DiscoveryStarted {
        discovery_id: String,
        success: bool,
        message: String,
        estimated_duration_seconds: i32,
    },

    Results {
        discovery_id: String,
        status: JobStatusEntry,
        devices: Vec<DiscoveredDevice>,
        interfaces: Vec<DiscoveredInterface>,
        topology: Vec<TopologyLink>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        progress: f64,
        #[serde(default)]
        raw_data: HashMap<String, serde_json::Value>,
    },

    Config {
        config: serde_json::Value,
    },

    ConfigChunk {
        config: serde_json::Value,
        is_final: bool,
    },

    AgentStatus {
        available: bool,
        /// JSON summary payload.
        message: String,
        service_name: String,
        service_type: String,
        agent_id: String,
    },

    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
