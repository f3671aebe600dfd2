//! # Fleet Core
//!
//! Core types and status mapping for the Fleet agent dashboard.
//!
//! ## What lives here
//! - The persisted agent and dispatch records
//! - The derived agent view joined from the registry and a runtime snapshot
//! - The error taxonomy surfaced by the HTTP boundary

pub mod agent;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod status;

pub use agent::{Agent, AgentView, FleetStatus, StatusCounts};
pub use container::{ContainerAction, ContainerStatus, RuntimeSnapshot};
pub use dispatch::{Dispatch, PayloadPolicy};
pub use error::{FleetError, Result};
pub use memory::{parse_memory_usage, MemoryTotals};
pub use status::{
    build_views, clamp_log_lines, container_refs, format_uptime, DEFAULT_LOG_LINES,
    MAX_LOG_LINES, MIN_LOG_LINES,
};

/// Current Fleet version for compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fleet build information for logging at startup
pub const BUILD_INFO: &str = concat!(
    "Fleet ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);

/// Standard API endpoints for the Fleet dashboard
pub mod endpoints {
    pub const HEALTH: &str = "/api/health";
    pub const METRICS: &str = "/api/metrics";
    pub const AGENTS: &str = "/api/agents";
    pub const AGENT_LOGS: &str = "/api/agents/{id}/logs";
    pub const AGENT_DISPATCH: &str = "/api/agents/{id}/dispatch";
    pub const AGENT_TEMPLATE: &str = "/api/agents/{id}/template";
    pub const AGENT_ACTIONS: &str = "/api/agents/{id}/actions";
}

/// Derived status when the container runtime cannot be reached
pub const STATUS_UNAVAILABLE: &str = "unavailable";

/// Derived status when no runtime record exists for an agent
pub const STATUS_UNKNOWN: &str = "unknown";

/// Runtime state that enables uptime reporting
pub const STATUS_RUNNING: &str = "running";
