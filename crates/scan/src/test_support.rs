// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock collaborators for prober/engine tests.

use crate::error::ScanError;
use crate::ping::Pinger;
use crate::snmp::{oids, SnmpClient, SnmpClientFactory, SnmpValue, VarBind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use sweep_core::SnmpCredentials;

/// Pinger double: everything reachable unless denied, with an optional
/// artificial delay per probe.
#[derive(Default)]
pub struct MockPinger {
    unreachable_all: bool,
    denied: HashSet<String>,
    delay: Duration,
}

impl MockPinger {
    pub fn reachable() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self { unreachable_all: true, ..Default::default() }
    }

    pub fn deny(mut self, ip: impl Into<String>) -> Self {
        self.denied.insert(ip.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Pinger for MockPinger {
    async fn is_reachable(&self, ip: &str, _timeout: Duration) -> bool {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        !self.unreachable_all && !self.denied.contains(ip)
    }
}

/// In-memory SNMP agent double: canned GET values and walk pages.
#[derive(Default)]
pub struct MockSnmpClient {
    values: HashMap<String, SnmpValue>,
    walks: HashMap<String, Vec<VarBind>>,
    fail_connect: bool,
}

impl MockSnmpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, oid: impl Into<String>, value: SnmpValue) -> Self {
        self.values.insert(oid.into(), value);
        self
    }

    pub fn with_str(self, oid: impl Into<String>, s: &str) -> Self {
        self.with_value(oid, SnmpValue::OctetString(s.as_bytes().to_vec()))
    }

    pub fn with_walk(mut self, root: impl Into<String>, bindings: Vec<VarBind>) -> Self {
        self.walks.insert(root.into(), bindings);
        self
    }

    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// A device answering the standard system queries, with the chassis
    /// MAC on `ifPhysAddress.1`.
    pub fn system(name: &str, mac: [u8; 6]) -> Self {
        Self::new()
            .with_str(oids::SYS_DESCR, "mock device")
            .with_value(oids::SYS_OBJECT_ID, SnmpValue::ObjectId(".1.3.6.1.4.1.8072".into()))
            .with_value(oids::SYS_UPTIME, SnmpValue::TimeTicks(360_000))
            .with_str(oids::SYS_CONTACT, "noc@example.net")
            .with_str(oids::SYS_NAME, name)
            .with_str(oids::SYS_LOCATION, "rack 12")
            .with_value(oids::IF_PHYS_ADDRESS_1, SnmpValue::OctetString(mac.to_vec()))
    }
}

#[async_trait]
impl SnmpClient for MockSnmpClient {
    async fn connect(&self) -> Result<(), ScanError> {
        if self.fail_connect {
            Err(ScanError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)))
        } else {
            Ok(())
        }
    }

    async fn get(&self, oids: &[&str]) -> Result<Vec<VarBind>, ScanError> {
        Ok(oids
            .iter()
            .filter_map(|oid| {
                self.values.get(*oid).map(|v| VarBind::new(oid.to_string(), v.clone()))
            })
            .collect())
    }

    async fn bulk_walk(&self, root: &str) -> Result<Vec<VarBind>, ScanError> {
        Ok(self.walks.get(root).cloned().unwrap_or_default())
    }
}

/// Factory double: per-target clients plus an optional catch-all, and a
/// record of every session it was asked to build.
#[derive(Default)]
pub struct MockSnmpFactory {
    clients: HashMap<String, Arc<MockSnmpClient>>,
    fallback: Option<Arc<MockSnmpClient>>,
    created: Mutex<Vec<String>>,
}

impl MockSnmpFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, target: impl Into<String>, client: MockSnmpClient) -> Self {
        self.clients.insert(target.into(), Arc::new(client));
        self
    }

    pub fn with_fallback(mut self, client: MockSnmpClient) -> Self {
        self.fallback = Some(Arc::new(client));
        self
    }

    /// Targets sessions were requested for, in order.
    pub fn created_targets(&self) -> Vec<String> {
        self.created.lock().clone()
    }
}

impl SnmpClientFactory for MockSnmpFactory {
    fn create(
        &self,
        target: &str,
        _credentials: &SnmpCredentials,
        _timeout: Duration,
        _retries: u32,
    ) -> Result<Arc<dyn SnmpClient>, ScanError> {
        self.created.lock().push(target.to_string());
        match self.clients.get(target).or(self.fallback.as_ref()) {
            Some(client) => Ok(Arc::clone(client) as Arc<dyn SnmpClient>),
            None => Err(ScanError::Unreachable),
        }
    }
}
