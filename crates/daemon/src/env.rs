// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: SWEEP_STATE_DIR > XDG_STATE_HOME/sweep >
/// ~/.local/state/sweep
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SWEEP_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sweep"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/sweep"))
}

/// Config file: SWEEP_CONFIG, else `<state_dir>/sweep.json`.
pub fn config_path(state_dir: &std::path::Path) -> PathBuf {
    match std::env::var("SWEEP_CONFIG") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => state_dir.join("sweep.json"),
    }
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("SWEEP_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
