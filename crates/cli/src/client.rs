// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC client for talking to a running sweepd.

use std::path::{Path, PathBuf};
use sweep_daemon::protocol::{read_message, write_message, decode, encode};
use sweep_daemon::{ErrorKind, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("daemon is not running (no socket at {0})")]
    NotRunning(PathBuf),

    #[error("cannot determine the daemon socket path: {0}")]
    NoSocket(String),

    #[error("daemon error ({kind:?}): {message}")]
    Daemon { kind: ErrorKind, message: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Default socket path, mirroring the daemon's layout.
pub fn default_socket_path() -> Result<PathBuf, CliError> {
    sweep_daemon::env::state_dir()
        .map(|dir| dir.join("sweepd.sock"))
        .map_err(|e| CliError::NoSocket(e.to_string()))
}

/// One connection to the daemon.
pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    pub async fn connect(socket: &Path) -> Result<Self, CliError> {
        match UnixStream::connect(socket).await {
            Ok(stream) => Ok(Self { stream }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound
                || e.kind() == std::io::ErrorKind::ConnectionRefused =>
            {
                Err(CliError::NotRunning(socket.to_path_buf()))
            }
            Err(e) => Err(CliError::Io(e)),
        }
    }

    /// Send one request, read one response. Daemon-side error envelopes
    /// become `CliError::Daemon`.
    pub async fn request(&mut self, request: &Request) -> Result<Response, CliError> {
        write_message(&mut self.stream, &encode(request)?).await?;
        let response: Response = decode(&read_message(&mut self.stream).await?)?;
        match response {
            Response::Error { kind, message } => Err(CliError::Daemon { kind, message }),
            other => Ok(other),
        }
    }
}
