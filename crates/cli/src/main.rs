// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sweep: control client for the network discovery daemon.

mod client;
mod output;

use clap::{Parser, Subcommand};
use client::{default_socket_path, CliError, DaemonClient};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use sweep_daemon::Request;

#[derive(Parser)]
#[command(name = "sweep", version, about = "Network discovery control client")]
struct Cli {
    /// Daemon socket path (default: the per-user state directory)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check daemon liveness
    Ping,
    /// Engine status, or one discovery's status
    Status {
        /// Discovery ID
        id: Option<String>,
    },
    /// Start a discovery job
    Start {
        /// Seed IP or CIDR; repeatable
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
        /// full | basic | interfaces | topology
        #[arg(long = "type", default_value = "full")]
        discovery_type: String,
        /// Prober concurrency (0 = engine default)
        #[arg(long, default_value_t = 0)]
        concurrency: usize,
        /// Per-request SNMP timeout in seconds (0 = engine default)
        #[arg(long, default_value_t = 0)]
        timeout_seconds: u64,
        #[arg(long, default_value_t = 0)]
        retries: u32,
        #[arg(long, default_value = "")]
        agent_id: String,
        #[arg(long, default_value = "")]
        poller_id: String,
    },
    /// Results of a completed discovery
    Results {
        id: String,
        /// Include raw per-target payloads
        #[arg(long)]
        raw: bool,
    },
    /// Results of the most recently finished discovery
    Latest {
        #[arg(long)]
        raw: bool,
    },
    /// Cancel an active discovery
    Cancel { id: String },
    /// Print the daemon's configuration
    Config,
    /// Agent-service status summary
    AgentStatus,
    /// Stop the daemon
    Shutdown,
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Command::Ping => Request::Ping,
            Command::Status { id } => Request::Status { discovery_id: id },
            Command::Start {
                seeds,
                discovery_type,
                concurrency,
                timeout_seconds,
                retries,
                agent_id,
                poller_id,
            } => Request::StartDiscovery {
                seeds,
                discovery_type,
                credentials: None,
                options: HashMap::new(),
                concurrency,
                timeout_seconds,
                retries,
                agent_id,
                poller_id,
            },
            Command::Results { id, raw } => {
                Request::GetResults { discovery_id: id, include_raw_data: raw }
            }
            Command::Latest { raw } => Request::GetLatestResults { include_raw_data: raw },
            Command::Cancel { id } => Request::Cancel { discovery_id: id },
            Command::Config => Request::GetConfig,
            Command::AgentStatus => Request::AgentStatus,
            Command::Shutdown => Request::Shutdown,
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let socket = match cli.socket {
        Some(socket) => socket,
        None => default_socket_path()?,
    };
    let mut client = DaemonClient::connect(&socket).await?;
    let response = client.request(&cli.command.into_request()).await?;
    output::render(&response);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sweep: {}", e);
            ExitCode::FAILURE
        }
    }
}
