//! Error types for the Fleet dashboard

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    #[error("Agent has no container configured: {agent_id}")]
    NoContainer { agent_id: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Container runtime is not available")]
    RuntimeUnavailable,

    #[error("Container runtime call failed: {reason}")]
    RuntimeFailure { reason: String },

    #[error("Container {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl FleetError {
    pub fn agent_not_found(agent_id: impl Into<String>) -> Self {
        Self::AgentNotFound {
            agent_id: agent_id.into(),
        }
    }

    /// Whether the failure came from the backing documents rather than the caller.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Corrupt { .. } | Self::Serialization { .. }
        )
    }
}
