// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ICMP reachability gate.
//!
//! Raw ICMP sockets need elevated privileges, so the production
//! implementation shells out to the system `ping(8)` binary, which is
//! setuid/caps-enabled on every supported platform.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Reachability check for one host.
#[async_trait]
pub trait Pinger: Send + Sync {
    /// True when the host answered within `timeout`.
    async fn is_reachable(&self, ip: &str, timeout: Duration) -> bool;
}

/// `ping(8)`-backed [`Pinger`].
#[derive(Debug, Clone, Default)]
pub struct ProcessPinger;

#[async_trait]
impl Pinger for ProcessPinger {
    async fn is_reachable(&self, ip: &str, timeout: Duration) -> bool {
        let wait_secs = timeout.as_secs().max(1);
        let child = Command::new("ping")
            .arg("-n")
            .arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_secs.to_string())
            .arg(ip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        // The subprocess has its own deadline; this one covers spawn
        // failures and unkillable children.
        match tokio::time::timeout(timeout + Duration::from_secs(1), child).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(ip, error = %e, "ping spawn failed");
                false
            }
            Err(_) => {
                debug!(ip, "ping timed out");
                false
            }
        }
    }
}
