// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relayd`: the debug relay daemon.
//!
//! Loads configuration from the environment, starts the session manager,
//! and runs until SIGINT/SIGTERM, then shuts down gracefully so live
//! sessions land in the recovery catalog.

use relay_daemon::{RelayConfig, SessionManager};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = RelayConfig::from_env();
    if let Err(e) = config.ensure_directories() {
        eprintln!("relayd: failed to create data directories: {e}");
        return ExitCode::FAILURE;
    }

    let filter =
        EnvFilter::try_from_env("RELAY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::never(&config.data_dir, "relay.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let manager = Arc::new(SessionManager::new(config));
    if let Err(e) = manager.start().await {
        tracing::error!(error = %e, "startup failed");
        eprintln!("relayd: startup failed: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("relayd ready");
    println!("READY");

    wait_for_shutdown().await;
    tracing::info!("shutdown signal received");
    manager.stop().await;
    ExitCode::SUCCESS
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
