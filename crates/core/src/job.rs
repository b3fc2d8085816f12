// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery job identity, parameters, and state machine.

use crate::cred::JobCredentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a discovery job.
    ///
    /// Each admitted job gets a fresh ID, unique for the lifetime of the
    /// process, used to query status and results and to reference the job
    /// in logs.
    pub struct JobId("disc-");
}

/// Which sub-queries a discovery job issues per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryType {
    /// System info, interfaces, and topology
    Full,
    /// System info only
    Basic,
    /// System info plus interface tables
    Interfaces,
    /// System info plus neighbor topology
    Topology,
}

impl DiscoveryType {
    /// Whether this mode walks the interface tables.
    pub fn wants_interfaces(&self) -> bool {
        matches!(self, DiscoveryType::Full | DiscoveryType::Interfaces)
    }

    /// Whether this mode queries LLDP/CDP neighbors.
    pub fn wants_topology(&self) -> bool {
        matches!(self, DiscoveryType::Full | DiscoveryType::Topology)
    }
}

crate::simple_display! {
    DiscoveryType {
        Full => "full",
        Basic => "basic",
        Interfaces => "interfaces",
        Topology => "topology",
    }
}

/// Error for unrecognized discovery type strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown discovery type: {0:?}")]
pub struct ParseDiscoveryTypeError(pub String);

impl FromStr for DiscoveryType {
    type Err = ParseDiscoveryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(DiscoveryType::Full),
            "basic" => Ok(DiscoveryType::Basic),
            "interfaces" => Ok(DiscoveryType::Interfaces),
            "topology" => Ok(DiscoveryType::Topology),
            other => Err(ParseDiscoveryTypeError(other.to_string())),
        }
    }
}

/// Lifecycle state of a discovery job.
///
/// Transitions: `Pending → Running → {Completed | Failed | Canceled}`.
/// Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl JobState {
    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Canceled)
    }
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Canceled => "canceled",
    }
}

/// Immutable parameters of a discovery job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParams {
    /// Input seeds: single IPs and CIDR blocks.
    pub seeds: Vec<String>,
    pub discovery_type: DiscoveryType,
    /// SNMP credentials; falls back to the engine defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<JobCredentials>,
    /// Per-job prober concurrency hint; 0 uses the engine default.
    #[serde(default)]
    pub concurrency: usize,
    /// Per-request SNMP timeout; None uses the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub retries: u32,
    pub agent_id: String,
    pub poller_id: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl JobParams {
    pub fn new(seeds: Vec<String>, discovery_type: DiscoveryType) -> Self {
        Self {
            seeds,
            discovery_type,
            credentials: None,
            concurrency: 0,
            timeout: None,
            retries: 0,
            agent_id: String::new(),
            poller_id: String::new(),
            options: HashMap::new(),
        }
    }

    crate::setters! {
        into {
            agent_id: String,
            poller_id: String,
        }
        set {
            concurrency: usize,
            retries: u32,
            options: HashMap<String, String>,
        }
        option {
            credentials: JobCredentials,
            timeout: Duration,
        }
    }
}

/// Mutable status of a discovery job.
///
/// `end_ms == 0` means the job has not reached a terminal state yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub start_ms: u64,
    pub end_ms: u64,
    /// 0–100, monotonically non-decreasing pre-terminal, pinned to 100 at
    /// terminal transition.
    pub progress: f64,
    pub devices_found: u64,
    pub interfaces_found: u64,
    pub links_found: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Pending
    }
}

/// Accumulated results of a discovery job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResults {
    pub devices: Vec<crate::device::DiscoveredDevice>,
    pub interfaces: Vec<crate::device::DiscoveredInterface>,
    pub links: Vec<crate::device::TopologyLink>,
    /// Raw per-target payloads keyed by target IP.
    #[serde(default)]
    pub raw: HashMap<String, serde_json::Value>,
}

impl JobResults {
    /// Copy of the results with the raw-data mapping stripped.
    pub fn without_raw(&self) -> Self {
        Self {
            devices: self.devices.clone(),
            interfaces: self.interfaces.clone(),
            links: self.links.clone(),
            raw: HashMap::new(),
        }
    }
}

crate::builder! {
    pub struct JobParamsBuilder => JobParams {
        into {
            agent_id: String = "agent-1",
            poller_id: String = "poller-1",
        }
        set {
            seeds: Vec<String> = vec!["192.168.1.1".to_string()],
            discovery_type: DiscoveryType = DiscoveryType::Basic,
            concurrency: usize = 0,
            retries: u32 = 0,
            options: HashMap<String, String> = HashMap::new(),
        }
        option {
            credentials: JobCredentials = None,
            timeout: Duration = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
