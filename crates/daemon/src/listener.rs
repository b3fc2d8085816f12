// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The listener runs in a spawned task, accepting connections and
//! handling them without blocking the engine. Each connection gets its
//! own task; requests dispatch against the shared engine handle.

use crate::env::PROTOCOL_VERSION;
use crate::protocol::{self, ErrorKind, JobStatusEntry, Request, Response};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{DiscoveryType, JobId, JobParams, SystemClock};
use sweep_engine::{estimated_duration_seconds, Engine, EngineError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub engine: Engine<SystemClock>,
    pub shutdown: Arc<Notify>,
}

/// Accept loop over the Unix socket.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run until the accept loop errors or the task is dropped at
    /// shutdown.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: protocol::ProtocolError) {
    match e {
        protocol::ProtocolError::Io(ref io)
            if io.kind() == std::io::ErrorKind::UnexpectedEof =>
        {
            debug!("client disconnected");
        }
        other => error!("connection error: {}", other),
    }
}

async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), protocol::ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let request = protocol::read_request(&mut reader).await?;
        let shutdown = matches!(&request, Request::Shutdown);
        let response = handle_request(ctx, request);
        protocol::write_response(&mut writer, &response).await?;
        if shutdown {
            ctx.shutdown.notify_waiters();
            return Ok(());
        }
    }
}

/// Dispatch one request. Pure with respect to the connection; all state
/// lives in the engine.
pub(crate) fn handle_request(ctx: &ListenCtx, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
            compatible: version == PROTOCOL_VERSION,
        },

        Request::Status { discovery_id: None } => {
            let (active, pending, completed) = ctx.engine.job_counts();
            Response::Status {
                available: true,
                status: format!("{} active discoveries", active),
                active_ids: ctx.engine.active_job_ids().iter().map(|id| id.to_string()).collect(),
                pending,
                completed,
                job: None,
            }
        }

        Request::Status { discovery_id: Some(id) } => match parse_job_id(&id) {
            None => not_found(&id),
            Some(job_id) => match ctx.engine.discovery_status(&job_id) {
                Ok(status) => {
                    let (_, pending, completed) = ctx.engine.job_counts();
                    Response::Status {
                        available: true,
                        status: status.state.to_string(),
                        active_ids: Vec::new(),
                        pending,
                        completed,
                        job: Some(JobStatusEntry::new(id, &status)),
                    }
                }
                Err(e) => error_response(e),
            },
        },

        Request::StartDiscovery {
            seeds,
            discovery_type,
            credentials,
            options,
            concurrency,
            timeout_seconds,
            retries,
            agent_id,
            poller_id,
        } => {
            let parsed_type = match DiscoveryType::from_str(&discovery_type) {
                Ok(parsed) => parsed,
                Err(e) => {
                    return Response::DiscoveryStarted {
                        discovery_id: String::new(),
                        success: false,
                        message: e.to_string(),
                        estimated_duration_seconds: 0,
                    };
                }
            };
            let seed_count = seeds.len();
            let mut params = JobParams::new(seeds, parsed_type)
                .agent_id(agent_id)
                .poller_id(poller_id)
                .concurrency(concurrency)
                .retries(retries)
                .options(options);
            params.credentials = credentials;
            if timeout_seconds > 0 {
                params.timeout = Some(Duration::from_secs(timeout_seconds));
            }

            match ctx.engine.start_discovery(params) {
                Ok(id) => {
                    info!(discovery = %id, "discovery admitted via IPC");
                    Response::DiscoveryStarted {
                        discovery_id: id.to_string(),
                        success: true,
                        message: "discovery started".to_string(),
                        estimated_duration_seconds: estimated_duration_seconds(
                            seed_count,
                            parsed_type,
                            concurrency,
                        ),
                    }
                }
                Err(e) => Response::DiscoveryStarted {
                    discovery_id: String::new(),
                    success: false,
                    message: e.to_string(),
                    estimated_duration_seconds: 0,
                },
            }
        }

        Request::GetResults { discovery_id, include_raw_data } => {
            match parse_job_id(&discovery_id) {
                None => not_found(&discovery_id),
                Some(job_id) => match ctx.engine.discovery_results(&job_id, include_raw_data) {
                    Ok(results) => results_response(results),
                    Err(e) => error_response(e),
                },
            }
        }

        Request::GetLatestResults { include_raw_data } => {
            match ctx.engine.latest_cached_results(include_raw_data) {
                Ok(results) => results_response(results),
                Err(e) => error_response(e),
            }
        }

        Request::Cancel { discovery_id } => match parse_job_id(&discovery_id) {
            None => not_found(&discovery_id),
            Some(job_id) => match ctx.engine.cancel_discovery(&job_id) {
                Ok(()) => Response::Ok,
                Err(e) => error_response(e),
            },
        },

        Request::GetConfig => match serde_json::to_value(ctx.engine.config()) {
            Ok(config) => Response::Config { config },
            Err(e) => Response::Error { kind: ErrorKind::Internal, message: e.to_string() },
        },

        Request::StreamConfig => match serde_json::to_value(ctx.engine.config()) {
            Ok(config) => Response::ConfigChunk { config, is_final: true },
            Err(e) => Response::Error { kind: ErrorKind::Internal, message: e.to_string() },
        },

        Request::AgentStatus => {
            let (active, pending, completed) = ctx.engine.job_counts();
            let message = serde_json::json!({
                "active_jobs": active,
                "pending_jobs": pending,
                "completed_jobs": completed,
            })
            .to_string();
            Response::AgentStatus {
                available: true,
                message,
                service_name: "network-discovery".to_string(),
                service_type: "discovery".to_string(),
                agent_id: ctx.engine.config().stream_config.agent_id.clone(),
            }
        }

        Request::Shutdown => Response::Ok,
    }
}

fn results_response(results: sweep_engine::DiscoveryResults) -> Response {
    let id = results.job_id.to_string();
    Response::Results {
        status: JobStatusEntry::new(id.clone(), &results.status),
        discovery_id: id,
        devices: results.results.devices,
        interfaces: results.results.interfaces,
        topology: results.results.links,
        error: results.status.error.clone(),
        progress: results.status.progress,
        raw_data: results.results.raw,
    }
}

/// IDs come from clients; anything that cannot be an ID maps to the
/// same error as a missing job.
fn parse_job_id(raw: &str) -> Option<JobId> {
    if raw.is_empty() || raw.len() > sweep_core::id::ID_MAX_LEN {
        return None;
    }
    Some(JobId::from_string(raw))
}

fn not_found(id: &str) -> Response {
    Response::Error { kind: ErrorKind::JobNotFound, message: format!("discovery job not found: {}", id) }
}

fn error_response(e: EngineError) -> Response {
    let kind = match e {
        EngineError::NoSeeds => ErrorKind::NoSeeds,
        EngineError::AtCapacity(_) => ErrorKind::AtCapacity,
        EngineError::WorkersBusy => ErrorKind::WorkersBusy,
        EngineError::ShuttingDown => ErrorKind::ShuttingDown,
        EngineError::JobNotFound(_) | EngineError::NoCachedResults => ErrorKind::JobNotFound,
        EngineError::JobStillActive(_) => ErrorKind::JobStillActive,
        EngineError::JobNotCompleted(_) => ErrorKind::JobNotCompleted,
        EngineError::JobNotActive(_) => ErrorKind::JobNotActive,
        EngineError::StopTimeout(_) | EngineError::Config(_) => ErrorKind::Internal,
    };
    Response::Error { kind, message: e.to_string() }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
