//! Container runtime state as seen by the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::status::format_uptime;
use crate::STATUS_RUNNING;

/// Live state of one container, keyed by its reference in a [`RuntimeSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Runtime-reported state, e.g. `running` or `exited`
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub restart_count: u64,
    pub memory_usage: Option<String>,
}

impl ContainerStatus {
    /// Time since start, only for running containers.
    pub fn uptime(&self, now: DateTime<Utc>) -> Option<String> {
        if self.status != STATUS_RUNNING {
            return None;
        }
        let started_at = self.started_at?;
        format_uptime(now.signed_duration_since(started_at))
    }
}

/// Everything one listing request learned from the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeSnapshot {
    /// The availability check failed; no runtime calls were made.
    Unavailable,
    /// Per-container state; references the runtime did not report are absent.
    Available(HashMap<String, ContainerStatus>),
}

impl RuntimeSnapshot {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Lifecycle operations an operator may run against an agent's container.
/// There is no removal: containers are never deleted from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
