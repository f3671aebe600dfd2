//! # Fleet Dashboard
//!
//! Operations dashboard for a fleet of container-backed agents

use clap::Parser;
use fleet_core::BUILD_INFO;
use fleet_dashboard::config::DEFAULT_LOG_FILTER;
use fleet_dashboard::{build_router, Config, DashboardState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting {}", BUILD_INFO);
    info!(
        agents = %config.agents_path.display(),
        dispatches = %config.dispatches_path.display(),
        runtime = %config.docker_cmd,
        "using configuration"
    );

    let bind_addr = config.bind_addr();
    let state = Arc::new(DashboardState::new(config));
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Fleet dashboard listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Fleet dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
