// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sweep_core::JobCredentials;

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Engine status; with an ID, one job's status
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discovery_id: Option<String>,
    },

    /// Admit a discovery job
    StartDiscovery {
        seeds: Vec<String>,
        #[serde(rename = "discovery_type")]
        discovery_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials: Option<JobCredentials>,
        #[serde(default)]
        options: HashMap<String, String>,
        /// 0 uses the engine default.
        #[serde(default)]
        concurrency: usize,
        /// 0 uses the engine default.
        #[serde(default)]
        timeout_seconds: u64,
        #[serde(default)]
        retries: u32,
        #[serde(default)]
        agent_id: String,
        #[serde(default)]
        poller_id: String,
    },

    /// Results of a completed job
    GetResults {
        discovery_id: String,
        #[serde(default)]
        include_raw_data: bool,
    },

    /// Results of the most recently finished job
    GetLatestResults {
        #[serde(default)]
        include_raw_data: bool,
    },

    /// Cancel an active job
    Cancel { discovery_id: String },

    /// The engine's JSON configuration as a single response
    GetConfig,

    /// The engine's JSON configuration as a one-chunk stream
    StreamConfig,

    /// Agent-service status summary
    AgentStatus,

    /// Request daemon shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
