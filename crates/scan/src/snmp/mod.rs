// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SNMP client seam and the bundled v1/v2c transport.
//!
//! The prober consumes only the [`SnmpClient`] / [`SnmpClientFactory`]
//! traits; the BER codec and UDP transport below them are a deliberately
//! small v1/v2c implementation. SNMPv3 (USM) is an external concern: the
//! credential model carries the full v3 field set, but the bundled
//! factory rejects it with `UnsupportedSnmpVersion`.

mod codec;
pub mod oids;
mod transport;
mod value;

pub use transport::{UdpSnmpClient, UdpSnmpFactory};
pub use value::{SnmpValue, VarBind};

use crate::error::ScanError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::SnmpCredentials;

/// One SNMP session against one target.
#[async_trait]
pub trait SnmpClient: Send + Sync {
    /// Open the transport. Must be called before `get`/`bulk_walk`.
    async fn connect(&self) -> Result<(), ScanError>;

    /// GET the given OIDs.
    async fn get(&self, oids: &[&str]) -> Result<Vec<VarBind>, ScanError>;

    /// Walk the subtree rooted at `root`, returning bindings in
    /// lexicographic OID order.
    async fn bulk_walk(&self, root: &str) -> Result<Vec<VarBind>, ScanError>;
}

/// Builds sessions from job-scoped credentials.
pub trait SnmpClientFactory: Send + Sync {
    fn create(
        &self,
        target: &str,
        credentials: &SnmpCredentials,
        timeout: Duration,
        retries: u32,
    ) -> Result<Arc<dyn SnmpClient>, ScanError>;
}
