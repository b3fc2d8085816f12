// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from probing and the SNMP transport.

use sweep_core::SnmpVersion;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The credential set selects a version the transport cannot speak.
    #[error("unsupported SNMP version: {0}")]
    UnsupportedSnmpVersion(SnmpVersion),

    #[error("SNMP request timed out")]
    Timeout,

    #[error("target is not reachable")]
    Unreachable,

    #[error("malformed SNMP response: {0}")]
    Decode(String),

    #[error("invalid OID: {0:?}")]
    InvalidOid(String),

    #[error("invalid target address: {0:?}")]
    InvalidTarget(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
