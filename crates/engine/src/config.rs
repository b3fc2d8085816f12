// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration: JSON file loading, validation, and the
//! defaulting rules for durations.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use sweep_core::duration::parse_duration;
use sweep_core::{JobCredentials, SnmpCredentials};
use sweep_sinks::StreamConfig;
use sweep_unifi::ControllerConfig;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESULT_RETENTION: Duration = Duration::from_secs(24 * 3600);

/// Fallback prober concurrency when a job does not carry its own hint.
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file missing or empty: {0}")]
    Missing(String),

    #[error("workers must be a positive integer")]
    InvalidWorkers,

    #[error("max_active_jobs must be a positive integer")]
    InvalidMaxActiveJobs,

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-target credential override block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(flatten)]
    pub credentials: SnmpCredentials,
}

/// One recurring job from static configuration. Interval/timeout stay
/// strings here; the scheduler parses them and skips entries it cannot
/// understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJobConfig {
    pub name: String,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default, rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub credentials: Option<JobCredentials>,
    #[serde(default)]
    pub concurrency: usize,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Top-level engine configuration (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub workers: usize,
    pub max_active_jobs: usize,
    /// Per-SNMP-request timeout. Invalid or missing falls back to 30s.
    #[serde(deserialize_with = "lenient_timeout")]
    #[serde(serialize_with = "sweep_core::duration::duration_str::serialize")]
    pub timeout: Duration,
    pub retries: u32,
    /// Completed-job retention. Invalid or missing falls back to 24h.
    #[serde(deserialize_with = "lenient_retention")]
    #[serde(serialize_with = "sweep_core::duration::duration_str::serialize")]
    pub result_retention: Duration,
    pub default_credentials: SnmpCredentials,
    pub credentials: Vec<CredentialEntry>,
    pub seeds: Vec<String>,
    /// Extra OIDs queried per discovery type and attached to raw data.
    pub oids: HashMap<String, Vec<String>>,
    pub unifi_apis: Vec<ControllerConfig>,
    pub scheduled_jobs: Vec<ScheduledJobConfig>,
    pub stream_config: StreamConfig,
    /// Opaque; consumed by the daemon's transport layer.
    pub security: serde_json::Value,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_active_jobs: 0,
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            result_retention: DEFAULT_RESULT_RETENTION,
            default_credentials: SnmpCredentials::default(),
            credentials: Vec::new(),
            seeds: Vec::new(),
            oids: HashMap::new(),
            unifi_apis: Vec::new(),
            scheduled_jobs: Vec::new(),
            stream_config: StreamConfig::default(),
            security: serde_json::Value::Null,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.display().to_string()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        if content.trim().is_empty() {
            return Err(ConfigError::Missing(path.display().to_string()));
        }
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.max_active_jobs == 0 {
            return Err(ConfigError::InvalidMaxActiveJobs);
        }
        Ok(())
    }

    /// Effective credentials for a job: the job's own set when provided,
    /// otherwise the engine defaults plus the per-target override list.
    pub fn job_credentials(&self, job_specific: Option<&JobCredentials>) -> JobCredentials {
        if let Some(creds) = job_specific {
            return creds.clone();
        }
        let mut target_specific = HashMap::new();
        for entry in &self.credentials {
            for target in &entry.targets {
                target_specific.insert(target.clone(), entry.credentials.clone());
            }
        }
        JobCredentials { default: self.default_credentials.clone(), target_specific }
    }

    /// Extra OIDs configured for a discovery type.
    pub fn extra_oids(&self, discovery_type: &str) -> Vec<String> {
        self.oids.get(discovery_type).cloned().unwrap_or_default()
    }
}

fn lenient_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
    field: &'static str,
    fallback: Duration,
) -> Result<Duration, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(fallback),
        Some(s) => match parse_duration(&s) {
            Ok(d) => Ok(d),
            Err(e) => {
                warn!(field, value = s, error = %e, "invalid duration, using default");
                Ok(fallback)
            }
        },
    }
}

fn lenient_timeout<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    lenient_duration(deserializer, "timeout", DEFAULT_TIMEOUT)
}

fn lenient_retention<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    lenient_duration(deserializer, "result_retention", DEFAULT_RESULT_RETENTION)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
