// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sweepd: the network discovery daemon.

use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let mut config_override: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => config_override = Some(PathBuf::from(path)),
                None => {
                    eprintln!("--config requires a path");
                    return ExitCode::from(2);
                }
            },
            "--help" | "-h" => {
                println!("usage: sweepd [--config <path>]");
                return ExitCode::SUCCESS;
            }
            "--version" | "-V" => {
                println!("sweepd {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("unknown argument: {}", other);
                return ExitCode::from(2);
            }
        }
    }

    match sweep_daemon::lifecycle::run(config_override).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sweepd: {}", e);
            ExitCode::FAILURE
        }
    }
}
