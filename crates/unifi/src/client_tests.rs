// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::types::ControllerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One-connection-at-a-time HTTP stub: maps request paths (with query)
/// to JSON bodies.
async fn spawn_server(routes: Vec<(&'static str, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { return };
            let mut buf = vec![0u8; 8192];
            let Ok(n) = stream.read(&mut buf).await else { continue };
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();
            let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
            let (status, body) = match routes.iter().find(|(p, _)| *p == path) {
                Some((_, body)) => ("200 OK", body.clone()),
                None => ("404 Not Found", "{}".to_string()),
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    format!("http://{}", addr)
}

fn config(base_url: &str) -> ControllerConfig {
    ControllerConfig {
        base_url: base_url.to_string(),
        api_key: "key".to_string(),
        name: "lab".to_string(),
        insecure_skip_verify: false,
    }
}

#[test]
fn missing_key_is_rejected_at_construction() {
    let err = HttpUnifiClient::new(&ControllerConfig {
        base_url: "https://ctl".into(),
        name: "lab".into(),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, UnifiError::MissingConfig(_)));
}

#[tokio::test]
async fn sites_decode() {
    let base = spawn_server(vec![(
        "/proxy/network/integrations/v1/sites?limit=100&offset=0",
        r#"{"data": [{"id": "site-1", "name": "Default"}]}"#.to_string(),
    )])
    .await;

    let client = HttpUnifiClient::new(&config(&base)).unwrap();
    let sites = client.sites().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].id, "site-1");
    assert_eq!(sites[0].name, "Default");
}

#[tokio::test]
async fn device_listing_follows_pages() {
    // First page is full (synthesized 100 rows), second is short.
    let first_page: Vec<String> = (0..100)
        .map(|i| format!(r#"{{"id": "dev-{}", "ipAddress": "10.0.0.{}"}}"#, i, i))
        .collect();
    let base = spawn_server(vec![
        (
            "/proxy/network/integrations/v1/sites/site-1/devices?limit=100&offset=0",
            format!(r#"{{"data": [{}]}}"#, first_page.join(",")),
        ),
        (
            "/proxy/network/integrations/v1/sites/site-1/devices?limit=100&offset=100",
            r#"{"data": [{"id": "dev-last"}]}"#.to_string(),
        ),
    ])
    .await;

    let client = HttpUnifiClient::new(&config(&base)).unwrap();
    let devices = client.devices("site-1").await.unwrap();
    assert_eq!(devices.len(), 101);
    assert_eq!(devices[100].id, "dev-last");
}

#[tokio::test]
async fn device_details_decode() {
    let base = spawn_server(vec![(
        "/proxy/network/integrations/v1/sites/site-1/devices/dev-1",
        r#"{
            "id": "dev-1",
            "ipAddress": "10.0.0.2",
            "lldpTable": [{"chassisId": "aa:bb:cc:dd:ee:ff", "portId": "eth1"}],
            "interfaces": ["radios"]
        }"#
        .to_string(),
    )])
    .await;

    let client = HttpUnifiClient::new(&config(&base)).unwrap();
    let details = client.device_details("site-1", "dev-1").await.unwrap();
    assert_eq!(details.ip, "10.0.0.2");
    assert_eq!(details.lldp_table.len(), 1);
    assert_eq!(
        crate::types::InterfacesField::parse(&details.interfaces),
        crate::types::InterfacesField::Sentinel,
    );
}

#[tokio::test]
async fn http_errors_surface_status() {
    let base = spawn_server(vec![]).await;
    let client = HttpUnifiClient::new(&config(&base)).unwrap();
    let err = client.sites().await.unwrap_err();
    assert!(matches!(err, UnifiError::Api { status: 404, .. }));
}
