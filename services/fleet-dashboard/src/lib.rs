//! # Fleet Dashboard
//!
//! REST API over the agent registry, the dispatch log and the container
//! runtime. The browser UI is served from a static directory.

pub mod aggregator;
pub mod config;
pub mod error;
mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use container_runtime::ContainerRuntime;
use fleet_core::{endpoints, PayloadPolicy};
use fleet_store::{AgentRegistry, DispatchLog};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug)]
pub struct DashboardState {
    pub config: Config,
    pub runtime: ContainerRuntime,
    pub registry: AgentRegistry,
    pub dispatches: DispatchLog,
    pub payload_policy: PayloadPolicy,
}

impl DashboardState {
    pub fn new(config: Config) -> Self {
        let runtime = ContainerRuntime::with_program(config.docker_cmd.clone());
        Self::with_runtime(config, runtime)
    }

    pub fn with_runtime(config: Config, runtime: ContainerRuntime) -> Self {
        Self {
            registry: AgentRegistry::new(config.agents_path.clone()),
            dispatches: DispatchLog::new(config.dispatches_path.clone()),
            payload_policy: config.payload_policy(),
            runtime,
            config,
        }
    }
}

pub fn build_router(state: Arc<DashboardState>) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route(endpoints::HEALTH, get(handlers::health))
        .route(endpoints::METRICS, get(handlers::metrics))
        .route(endpoints::AGENTS, get(handlers::list_agents))
        .route(endpoints::AGENT_LOGS, get(handlers::agent_logs))
        .route(endpoints::AGENT_DISPATCH, post(handlers::dispatch))
        .route(endpoints::AGENT_TEMPLATE, patch(handlers::update_template))
        .route(endpoints::AGENT_ACTIONS, post(handlers::container_action))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
}
