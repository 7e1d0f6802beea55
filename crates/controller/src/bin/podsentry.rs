/*
 * 5D Labs Platform - Pod Failure Alerting
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Podsentry - Kubernetes pod failure alerts
//!
//! - Watches pods cluster-wide or in one namespace
//! - Sends a Slack alert per failing (pod, reason), debounced
//! - Serves `/health` and `/ready`

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use podsentry::server::{self, HealthState};
use podsentry::watch::run_pod_watcher;
use podsentry::{ApiPodSource, Cli, ControllerConfig, DebounceStore, LogFormat, Reconciler};
use podsentry_notify::{SetupError, SlackNotifier};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting Podsentry v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(ControllerConfig::load(&cli).context("Invalid configuration")?);

    // A missing webhook is fatal before anything is watched.
    let webhook_url = cli
        .webhook_url
        .as_deref()
        .ok_or(SetupError::MissingWebhookUrl)?;
    let notifier = SlackNotifier::new(webhook_url)?;

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let debounce = Arc::new(DebounceStore::new(config.debounce_window()));
    let reconciler = Arc::new(
        Reconciler::new(
            Arc::new(ApiPodSource::new(client.clone())),
            Arc::new(notifier),
            Arc::clone(&debounce),
        )
        .with_retry_delay(config.retry_delay()),
    );
    let ready = Arc::new(AtomicBool::new(false));

    info!(
        namespace = config.namespace.as_deref().unwrap_or("*"),
        debounce_window_secs = config.debounce_window_seconds,
        retry_delay_secs = config.retry_delay_seconds,
        "Controller configured"
    );

    let watcher_handle = tokio::spawn(run_pod_watcher(
        client,
        Arc::clone(&config),
        reconciler,
        Arc::clone(&ready),
    ));

    let app = server::router(HealthState { ready, debounce });
    let addr = config.health_socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health server on {addr}"))?;
    info!("Health server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if watcher_handle.is_finished() {
        error!("Pod watcher exited before shutdown");
    }
    watcher_handle.abort();
    info!("Podsentry stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
