// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering of daemon responses.

use sweep_daemon::{JobStatusEntry, Response};

pub fn render(response: &Response) {
    match response {
        Response::Ok => println!("ok"),
        Response::Pong => println!("pong"),
        Response::Hello { version, compatible } => {
            println!("daemon version {} (compatible: {})", version, compatible);
        }
        Response::Status { status, active_ids, pending, completed, job, .. } => {
            match job {
                Some(job) => render_job(job),
                None => {
                    println!("engine: {}", status);
                    println!("pending: {}  completed: {}", pending, completed);
                    for id in active_ids {
                        println!("  active: {}", id);
                    }
                }
            }
        }
        Response::DiscoveryStarted {
            discovery_id,
            success,
            message,
            estimated_duration_seconds,
        } => {
            if *success {
                println!("{}", discovery_id);
                println!("estimated duration: {}s", estimated_duration_seconds);
            } else {
                println!("rejected: {}", message);
            }
        }
        Response::Results { discovery_id, status, devices, interfaces, topology, .. } => {
            println!("discovery {}", discovery_id);
            render_job(status);
            println!(
                "{} devices, {} interfaces, {} links",
                devices.len(),
                interfaces.len(),
                topology.len()
            );
            for device in devices {
                let mac = if device.mac.is_empty() { "-" } else { &device.mac };
                let hostname = if device.hostname.is_empty() { "-" } else { &device.hostname };
                println!("  {:<16} {:<18} {}", device.ip, mac, hostname);
            }
        }
        Response::Config { config } | Response::ConfigChunk { config, .. } => {
            match serde_json::to_string_pretty(config) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{}", config),
            }
        }
        Response::AgentStatus { available, message, service_name, agent_id, .. } => {
            println!("{} (agent {}) available: {}", service_name, agent_id, available);
            println!("{}", message);
        }
        Response::Error { kind, message } => {
            // The client maps these to errors before rendering; kept for
            // completeness.
            println!("error ({:?}): {}", kind, message);
        }
    }
}

fn render_job(job: &JobStatusEntry) {
    println!("  state:    {}", job.state);
    println!("  progress: {:.0}%", job.progress);
    println!(
        "  found:    {} devices, {} interfaces, {} links",
        job.devices_found, job.interfaces_found, job.links_found
    );
    if let Some(error) = &job.error {
        println!("  note:     {}", error);
    }
}
