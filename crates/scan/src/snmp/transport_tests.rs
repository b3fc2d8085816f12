// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::codec::{decode_message, format_oid, parse_oid, PDU_RESPONSE};
use super::*;
use std::time::Duration;
use sweep_core::SnmpCredentials;
use tokio::net::UdpSocket;

// -- tiny response encoder for the mock agent --------------------------------

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    assert!(content.len() < 0x80, "test encoder only handles short form");
    let mut out = vec![tag, content.len() as u8];
    out.extend_from_slice(content);
    out
}

fn int_tlv(v: i64) -> Vec<u8> {
    let mut bytes = v.to_be_bytes().to_vec();
    while bytes.len() > 1 && ((bytes[0] == 0 && bytes[1] & 0x80 == 0) || (bytes[0] == 0xFF && bytes[1] & 0x80 != 0)) {
        bytes.remove(0);
    }
    tlv(0x02, &bytes)
}

fn oid_content(arcs: &[u64]) -> Vec<u8> {
    let mut out = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for arc in &arcs[2..] {
        let mut v = *arc;
        let mut stack = Vec::new();
        loop {
            stack.push((v & 0x7F) as u8);
            v >>= 7;
            if v == 0 {
                break;
            }
        }
        for (i, byte) in stack.iter().enumerate().rev() {
            out.push(if i == 0 { *byte } else { *byte | 0x80 });
        }
    }
    out
}

fn value_tlv(value: &SnmpValue) -> Vec<u8> {
    match value {
        SnmpValue::Integer(v) => int_tlv(*v),
        SnmpValue::OctetString(bytes) => tlv(0x04, bytes),
        SnmpValue::Gauge32(v) => {
            let mut bytes = u64::from(*v).to_be_bytes().to_vec();
            while bytes.len() > 1 && bytes[0] == 0 {
                bytes.remove(0);
            }
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0);
            }
            tlv(0x42, &bytes)
        }
        SnmpValue::EndOfMibView => tlv(0x82, &[]),
        other => panic!("test encoder does not handle {:?}", other),
    }
}

fn response(request_id: i32, bindings: &[(&str, SnmpValue)]) -> Vec<u8> {
    let mut list = Vec::new();
    for (oid, value) in bindings {
        let arcs = parse_oid(oid).unwrap();
        let mut inner = tlv(0x06, &oid_content(&arcs));
        inner.extend(value_tlv(value));
        list.extend(tlv(0x30, &inner));
    }
    let mut pdu = int_tlv(i64::from(request_id));
    pdu.extend(int_tlv(0));
    pdu.extend(int_tlv(0));
    pdu.extend(tlv(0x30, &list));

    let mut msg = int_tlv(1);
    msg.extend(tlv(0x04, b"public"));
    msg.extend(tlv(0xA2, &pdu));
    tlv(0x30, &msg)
}

/// Spawn a one-shot agent answering each request via `reply`, which maps
/// (request number, request id, first oid) to an optional datagram.
async fn spawn_agent(
    reply: impl Fn(usize, i32, String) -> Option<Vec<u8>> + Send + 'static,
) -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 65_535];
        let mut count = 0usize;
        loop {
            let Ok((n, from)) = socket.recv_from(&mut buf).await else { return };
            let Ok((_, _, pdu)) = decode_message(&buf[..n]) else { continue };
            assert_ne!(pdu.pdu_type, PDU_RESPONSE);
            let first_oid = pdu.bindings.first().map(|(arcs, _)| format_oid(arcs)).unwrap_or_default();
            if let Some(datagram) = reply(count, pdu.request_id, first_oid) {
                socket.send_to(&datagram, from).await.unwrap();
            }
            count += 1;
        }
    });
    addr.to_string()
}

fn client(target: &str, timeout_ms: u64, retries: u32) -> UdpSnmpClient {
    UdpSnmpClient::new(
        target,
        sweep_core::SnmpVersion::V2c,
        "public",
        Duration::from_millis(timeout_ms),
        retries,
    )
    .unwrap()
}

#[tokio::test]
async fn get_round_trip() {
    let addr = spawn_agent(|_, id, _| {
        Some(response(id, &[(".1.3.6.1.2.1.1.5.0", SnmpValue::OctetString(b"dev1".to_vec()))]))
    })
    .await;

    let client = client(&addr, 500, 0);
    client.connect().await.unwrap();
    let binds = client.get(&[".1.3.6.1.2.1.1.5.0"]).await.unwrap();
    assert_eq!(binds.len(), 1);
    assert_eq!(binds[0].oid, ".1.3.6.1.2.1.1.5.0");
    assert_eq!(binds[0].value.display_string(), "dev1");
}

#[tokio::test]
async fn get_retries_after_dropped_datagram() {
    let addr = spawn_agent(|count, id, _| {
        if count == 0 {
            None // swallow the first request
        } else {
            Some(response(id, &[(".1.3.6.1.2.1.1.5.0", SnmpValue::Integer(7))]))
        }
    })
    .await;

    let client = client(&addr, 100, 1);
    client.connect().await.unwrap();
    let binds = client.get(&[".1.3.6.1.2.1.1.5.0"]).await.unwrap();
    assert_eq!(binds[0].value, SnmpValue::Integer(7));
}

#[tokio::test]
async fn get_times_out_when_agent_is_silent() {
    let addr = spawn_agent(|_, _, _| None).await;
    let client = client(&addr, 50, 1);
    client.connect().await.unwrap();
    let err = client.get(&[".1.3.6.1.2.1.1.5.0"]).await.unwrap_err();
    assert!(matches!(err, ScanError::Timeout));
}

#[tokio::test]
async fn get_without_connect_fails() {
    let client = client("127.0.0.1:1161", 50, 0);
    assert!(client.get(&[".1.3.6.1.2.1.1.5.0"]).await.is_err());
}

#[tokio::test]
async fn bulk_walk_stops_at_subtree_boundary() {
    let root = ".1.3.6.1.2.1.2.2.1.6";
    let addr = spawn_agent(move |_, id, first| {
        // First page: two in-subtree rows; second page crosses into the
        // next column.
        if first.ends_with(".6") {
            Some(response(
                id,
                &[
                    (".1.3.6.1.2.1.2.2.1.6.1", SnmpValue::OctetString(vec![0, 1, 2, 3, 4, 5])),
                    (".1.3.6.1.2.1.2.2.1.6.2", SnmpValue::OctetString(vec![])),
                ],
            ))
        } else {
            Some(response(id, &[(".1.3.6.1.2.1.2.2.1.7.1", SnmpValue::Integer(1))]))
        }
    })
    .await;

    let client = client(&addr, 500, 0);
    client.connect().await.unwrap();
    let binds = client.bulk_walk(root).await.unwrap();
    assert_eq!(binds.len(), 2);
    assert_eq!(binds[0].oid, ".1.3.6.1.2.1.2.2.1.6.1");
    assert_eq!(binds[1].oid, ".1.3.6.1.2.1.2.2.1.6.2");
}

#[tokio::test]
async fn bulk_walk_stops_on_end_of_mib_view() {
    let addr = spawn_agent(|_, id, _| {
        Some(response(
            id,
            &[
                (".1.3.6.1.2.1.2.2.1.6.1", SnmpValue::Integer(1)),
                (".1.3.6.1.2.1.2.2.1.6.2", SnmpValue::EndOfMibView),
            ],
        ))
    })
    .await;

    let client = client(&addr, 500, 0);
    client.connect().await.unwrap();
    let binds = client.bulk_walk(".1.3.6.1.2.1.2.2.1.6").await.unwrap();
    assert_eq!(binds.len(), 1);
}

#[test]
fn factory_rejects_v3() {
    let factory = UdpSnmpFactory;
    let creds = SnmpCredentials {
        version: sweep_core::SnmpVersion::V3,
        username: "admin".into(),
        ..Default::default()
    };
    let result = factory.create("10.0.0.1", &creds, Duration::from_secs(1), 0);
    assert!(matches!(result, Err(ScanError::UnsupportedSnmpVersion(_))));
}

#[test]
fn factory_builds_v2c_sessions() {
    let factory = UdpSnmpFactory;
    let creds = SnmpCredentials::community("public");
    assert!(factory.create("10.0.0.1", &creds, Duration::from_secs(1), 0).is_ok());
}

#[test]
fn invalid_target_is_rejected() {
    assert!(matches!(
        UdpSnmpClient::new("not-an-ip", sweep_core::SnmpVersion::V2c, "c", Duration::from_secs(1), 0),
        Err(ScanError::InvalidTarget(_)),
    ));
}
