// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SNMP credential model shared by config, engine, and transport.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2c")]
    V2c,
    #[serde(rename = "v3")]
    V3,
}

impl Default for SnmpVersion {
    fn default() -> Self {
        SnmpVersion::V2c
    }
}

crate::simple_display! {
    SnmpVersion {
        V1 => "v1",
        V2c => "v2c",
        V3 => "v3",
    }
}

/// Error for unrecognized SNMP version strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SNMP version: {0:?}")]
pub struct ParseSnmpVersionError(pub String);

impl FromStr for SnmpVersion {
    type Err = ParseSnmpVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" | "1" => Ok(SnmpVersion::V1),
            "v2c" | "v2" | "2c" | "2" => Ok(SnmpVersion::V2c),
            "v3" | "3" => Ok(SnmpVersion::V3),
            other => Err(ParseSnmpVersionError(other.to_string())),
        }
    }
}

/// Credentials for one SNMP target or the job default.
///
/// v1/v2c use `community`; v3 uses the USM fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnmpCredentials {
    #[serde(default)]
    pub version: SnmpVersion,
    #[serde(default)]
    pub community: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub auth_protocol: String,
    #[serde(default)]
    pub auth_password: String,
    #[serde(default)]
    pub privacy_protocol: String,
    #[serde(default)]
    pub privacy_password: String,
}

impl SnmpCredentials {
    /// v2c community credentials, the common case.
    pub fn community(community: impl Into<String>) -> Self {
        Self { version: SnmpVersion::V2c, community: community.into(), ..Default::default() }
    }
}

/// Job-scoped credential set: a default plus per-target overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCredentials {
    #[serde(default)]
    pub default: SnmpCredentials,
    /// Keyed by target IP.
    #[serde(default)]
    pub target_specific: HashMap<String, SnmpCredentials>,
}

impl JobCredentials {
    /// Credentials for one target: the target-specific entry when present,
    /// the job default otherwise.
    pub fn for_target(&self, target_ip: &str) -> &SnmpCredentials {
        self.target_specific.get(target_ip).unwrap_or(&self.default)
    }
}

#[cfg(test)]
#[path = "cred_tests.rs"]
mod tests;
