// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and JSON encoding.

use super::*;

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {}", json_str);
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&(u32::MAX).to_be_bytes());
    buffer.extend_from_slice(b"junk");
    let mut cursor = std::io::Cursor::new(buffer);
    assert!(matches!(read_message(&mut cursor).await, Err(ProtocolError::TooLarge(_))));
}

#[tokio::test]
async fn request_round_trips_through_the_wire() {
    let request = Request::StartDiscovery {
        seeds: vec!["10.0.0.0/24".to_string()],
        discovery_type: "full".to_string(),
        credentials: None,
        options: Default::default(),
        concurrency: 8,
        timeout_seconds: 30,
        retries: 1,
        agent_id: "agent-1".to_string(),
        poller_id: "poller-1".to_string(),
    };

    let mut buffer = Vec::new();
    write_message(&mut buffer, &encode(&request).unwrap()).await.unwrap();
    let mut cursor = std::io::Cursor::new(buffer);
    let parsed = read_request(&mut cursor).await.unwrap();
    assert_eq!(parsed, request);
}

#[tokio::test]
async fn truncated_message_is_an_io_error() {
    let mut buffer = Vec::new();
    write_message(&mut buffer, b"full payload").await.unwrap();
    buffer.truncate(buffer.len() - 4);
    let mut cursor = std::io::Cursor::new(buffer);
    assert!(matches!(read_message(&mut cursor).await, Err(ProtocolError::Io(_))));
}
