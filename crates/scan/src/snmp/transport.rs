// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UDP transport for SNMP v1/v2c.

use super::codec::{
    self, Pdu, ERR_NO_SUCH_NAME, PDU_GET, PDU_GET_BULK, PDU_GET_NEXT, PDU_RESPONSE,
};
use super::value::{SnmpValue, VarBind};
use super::{SnmpClient, SnmpClientFactory};
use crate::error::ScanError;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{SnmpCredentials, SnmpVersion};
use tokio::net::UdpSocket;
use tracing::debug;

const SNMP_PORT: u16 = 161;

/// Rows fetched per GetBulk round trip.
const BULK_MAX_REPETITIONS: i64 = 20;

/// Upper bound on bindings returned by one walk. Defends against agents
/// with broken lexicographic ordering.
const WALK_LIMIT: usize = 100_000;

/// SNMP v1/v2c session over UDP.
pub struct UdpSnmpClient {
    peer: SocketAddr,
    /// 0 = v1, 1 = v2c, on the wire.
    wire_version: i64,
    community: Vec<u8>,
    timeout: Duration,
    retries: u32,
    socket: tokio::sync::Mutex<Option<Arc<UdpSocket>>>,
    next_request_id: AtomicI32,
}

impl UdpSnmpClient {
    pub fn new(
        target: &str,
        version: SnmpVersion,
        community: &str,
        timeout: Duration,
        retries: u32,
    ) -> Result<Self, ScanError> {
        let peer = parse_target(target)?;
        let wire_version = match version {
            SnmpVersion::V1 => 0,
            SnmpVersion::V2c => 1,
            SnmpVersion::V3 => return Err(ScanError::UnsupportedSnmpVersion(version)),
        };
        Ok(Self {
            peer,
            wire_version,
            community: community.as_bytes().to_vec(),
            timeout,
            retries,
            socket: tokio::sync::Mutex::new(None),
            next_request_id: AtomicI32::new(1),
        })
    }

    async fn socket(&self) -> Result<Arc<UdpSocket>, ScanError> {
        self.socket
            .lock()
            .await
            .clone()
            .ok_or_else(|| ScanError::Io(std::io::Error::from(std::io::ErrorKind::NotConnected)))
    }

    /// One request/response exchange with per-attempt timeout and
    /// request-id matching. Stray datagrams (mismatched ids, decode
    /// failures) are skipped within the attempt's deadline.
    async fn request(
        &self,
        pdu_type: u8,
        f1: i64,
        f2: i64,
        oids: &[Vec<u64>],
    ) -> Result<Pdu, ScanError> {
        let socket = self.socket().await?;
        let mut last_err = ScanError::Timeout;
        for _attempt in 0..=self.retries {
            let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
            let buf =
                codec::encode_request(self.wire_version, &self.community, pdu_type, request_id, f1, f2, oids)?;
            if let Err(e) = socket.send(&buf).await {
                last_err = ScanError::Io(e);
                continue;
            }

            let deadline = tokio::time::Instant::now() + self.timeout;
            let mut recv_buf = vec![0u8; 65_535];
            loop {
                let recv = tokio::time::timeout_at(deadline, socket.recv(&mut recv_buf)).await;
                match recv {
                    Err(_) => {
                        last_err = ScanError::Timeout;
                        break;
                    }
                    Ok(Err(e)) => {
                        last_err = ScanError::Io(e);
                        break;
                    }
                    Ok(Ok(n)) => match codec::decode_message(&recv_buf[..n]) {
                        Ok((_, _, pdu))
                            if pdu.pdu_type == PDU_RESPONSE && pdu.request_id == request_id =>
                        {
                            return Ok(pdu);
                        }
                        Ok(_) => {
                            debug!(peer = %self.peer, "dropping mismatched SNMP response");
                        }
                        Err(e) => {
                            debug!(peer = %self.peer, error = %e, "dropping undecodable datagram");
                        }
                    },
                }
            }
        }
        Err(last_err)
    }

    async fn get_next(&self, start: &[u64]) -> Result<Pdu, ScanError> {
        self.request(PDU_GET_NEXT, 0, 0, &[start.to_vec()]).await
    }
}

fn parse_target(target: &str) -> Result<SocketAddr, ScanError> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    target
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, SNMP_PORT))
        .map_err(|_| ScanError::InvalidTarget(target.to_string()))
}

#[async_trait]
impl SnmpClient for UdpSnmpClient {
    async fn connect(&self) -> Result<(), ScanError> {
        let bind_addr: SocketAddr = if self.peer.is_ipv4() {
            "0.0.0.0:0".parse().map_err(|_| ScanError::InvalidTarget("0.0.0.0:0".into()))?
        } else {
            "[::]:0".parse().map_err(|_| ScanError::InvalidTarget("[::]:0".into()))?
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(self.peer).await?;
        *self.socket.lock().await = Some(Arc::new(socket));
        Ok(())
    }

    async fn get(&self, oids: &[&str]) -> Result<Vec<VarBind>, ScanError> {
        let arcs: Result<Vec<Vec<u64>>, ScanError> =
            oids.iter().map(|oid| codec::parse_oid(oid)).collect();
        let pdu = self.request(PDU_GET, 0, 0, &arcs?).await?;
        if pdu.error_status == ERR_NO_SUCH_NAME {
            // v1 agents report missing variables as an error; treat as
            // an empty answer like the v2c exception values.
            return Ok(Vec::new());
        }
        if pdu.error_status != 0 {
            return Err(ScanError::Decode(format!(
                "agent returned error-status {} at index {}",
                pdu.error_status, pdu.error_index
            )));
        }
        Ok(pdu
            .bindings
            .into_iter()
            .map(|(arcs, value)| VarBind::new(codec::format_oid(&arcs), value))
            .collect())
    }

    async fn bulk_walk(&self, root: &str) -> Result<Vec<VarBind>, ScanError> {
        let root_arcs = codec::parse_oid(root)?;
        let mut out: Vec<VarBind> = Vec::new();
        let mut cursor = root_arcs.clone();

        'walk: loop {
            let pdu = if self.wire_version == 0 {
                self.get_next(&cursor).await?
            } else {
                self.request(PDU_GET_BULK, 0, BULK_MAX_REPETITIONS, &[cursor.clone()]).await?
            };
            if pdu.error_status == ERR_NO_SUCH_NAME {
                // v1 end-of-MIB.
                break;
            }
            if pdu.error_status != 0 {
                return Err(ScanError::Decode(format!(
                    "agent returned error-status {} during walk",
                    pdu.error_status
                )));
            }
            if pdu.bindings.is_empty() {
                break;
            }
            for (arcs, value) in pdu.bindings {
                if value == SnmpValue::EndOfMibView || !codec::oid_in_subtree(&root_arcs, &arcs) {
                    break 'walk;
                }
                // GetNext/GetBulk results are strictly after the cursor;
                // anything else means the agent is looping.
                if arcs <= cursor {
                    return Err(ScanError::Decode("walk is not advancing".into()));
                }
                cursor = arcs.clone();
                out.push(VarBind::new(codec::format_oid(&arcs), value));
                if out.len() >= WALK_LIMIT {
                    break 'walk;
                }
            }
        }
        Ok(out)
    }
}

/// Factory producing [`UdpSnmpClient`] sessions for v1/v2c credentials.
#[derive(Debug, Clone, Default)]
pub struct UdpSnmpFactory;

impl SnmpClientFactory for UdpSnmpFactory {
    fn create(
        &self,
        target: &str,
        credentials: &SnmpCredentials,
        timeout: Duration,
        retries: u32,
    ) -> Result<Arc<dyn SnmpClient>, ScanError> {
        match credentials.version {
            SnmpVersion::V1 | SnmpVersion::V2c => Ok(Arc::new(UdpSnmpClient::new(
                target,
                credentials.version,
                &credentials.community,
                timeout,
                retries,
            )?)),
            SnmpVersion::V3 => Err(ScanError::UnsupportedSnmpVersion(credentials.version)),
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
