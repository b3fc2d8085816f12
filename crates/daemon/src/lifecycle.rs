// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, wiring of the real
//! collaborators.

use crate::env;
use crate::listener::{ListenCtx, Listener};
use fs2::FileExt;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::SystemClock;
use sweep_engine::{Collaborators, Engine, EngineConfig, EngineError};
use sweep_scan::{ProcessPinger, UdpSnmpFactory};
use sweep_sinks::JsonlSink;
use sweep_unifi::{HttpUnifiClient, UnifiApi};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot determine a state directory (HOME unset)")]
    NoStateDir,

    #[error("another sweepd instance holds the lock at {0}")]
    AlreadyRunning(PathBuf),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("config error: {0}")]
    Config(#[from] sweep_engine::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resolved daemon paths.
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub config_path: PathBuf,
    pub streams_dir: PathBuf,
}

impl Paths {
    /// Fixed layout under the state directory; one daemon per user.
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("sweepd.sock"),
            lock_path: state_dir.join("sweepd.pid"),
            log_path: state_dir.join("sweepd.log"),
            config_path: config_override.unwrap_or_else(|| env::config_path(&state_dir)),
            streams_dir: state_dir.join("streams"),
            state_dir,
        })
    }
}

/// Take the exclusive daemon lock, writing our PID into it.
fn acquire_lock(paths: &Paths) -> Result<File, LifecycleError> {
    let file = File::create(&paths.lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| LifecycleError::AlreadyRunning(paths.lock_path.clone()))?;
    std::fs::write(&paths.lock_path, std::process::id().to_string())?;
    Ok(file)
}

/// Wire up the production collaborators from config.
fn collaborators(config: &EngineConfig, paths: &Paths) -> Collaborators {
    let mut unifi: Vec<Arc<dyn UnifiApi>> = Vec::new();
    for controller in &config.unifi_apis {
        match HttpUnifiClient::new(controller) {
            Ok(client) => unifi.push(Arc::new(client)),
            Err(e) => warn!(controller = controller.name, error = %e, "skipping controller"),
        }
    }
    Collaborators {
        pinger: Arc::new(ProcessPinger),
        snmp: Arc::new(UdpSnmpFactory),
        unifi,
        publisher: Arc::new(JsonlSink::new(&paths.streams_dir, config.stream_config.clone())),
    }
}

/// Full daemon run: lock, config, engine, listener, signals, shutdown.
pub async fn run(config_override: Option<PathBuf>) -> Result<(), LifecycleError> {
    let paths = Paths::resolve(config_override)?;
    std::fs::create_dir_all(&paths.state_dir)?;

    // NOTE(lifetime): held for the daemon's lifetime; released on drop.
    let _lock = acquire_lock(&paths)?;

    let config = EngineConfig::load(&paths.config_path)?;
    init_tracing(&paths, &config);
    info!(config = %paths.config_path.display(), "sweepd starting");

    let engine = Engine::new(config.clone(), collaborators(&config, &paths), SystemClock)?;
    engine.start();

    // A stale socket from a crashed run would fail the bind.
    let _ = std::fs::remove_file(&paths.socket_path);
    let unix = UnixListener::bind(&paths.socket_path)?;
    info!(socket = %paths.socket_path.display(), "listening");

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx { engine: engine.clone(), shutdown: Arc::clone(&shutdown) });
    let listener_task = tokio::spawn(Listener::new(unix, ctx).run());

    wait_for_shutdown(&shutdown).await;
    info!("shutdown requested");

    listener_task.abort();
    engine.stop(Duration::from_secs(10)).await?;
    let _ = std::fs::remove_file(&paths.socket_path);
    info!("sweepd stopped");
    Ok(())
}

fn init_tracing(paths: &Paths, config: &EngineConfig) {
    let level =
        if config.logging.level.is_empty() { "info" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_path = config
        .logging
        .file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.log_path.clone());
    match log_path.parent().map(std::fs::create_dir_all) {
        Some(Err(e)) => {
            eprintln!("cannot create log directory: {}", e);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
        _ => {
            let appender = tracing_appender::rolling::never(
                log_path.parent().unwrap_or(&paths.state_dir),
                log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("sweepd.log")),
            );
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(appender)
                .with_ansi(false)
                .init();
        }
    }
}

async fn wait_for_shutdown(shutdown: &Notify) {
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler");
            shutdown.notified().await;
            return;
        }
    };
    tokio::select! {
        _ = shutdown.notified() => {}
        _ = sigterm.recv() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "ctrl-c handler failed");
            }
        }
    }
}
