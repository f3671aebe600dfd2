//! Dispatch records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{FleetError, Result};

/// A message queued against an agent. Appended once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub id: Uuid,
    pub agent_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Dispatch {
    pub fn new(agent_id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// How strictly dispatch bodies are checked before they are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadPolicy {
    /// Reject bodies without a non-empty string `message`
    pub require_message: bool,
}

impl PayloadPolicy {
    /// Turn a request body into the payload to store.
    ///
    /// Bodies must be objects or arrays. An absent or `null` body, or one
    /// with no entries (`{}`, `[]`), becomes `{"message": ""}` unless a
    /// message is required.
    pub fn accept(&self, body: Option<Value>) -> Result<Value> {
        let payload = match body {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            Some(_) => {
                return Err(FleetError::InvalidRequest {
                    reason: "dispatch body must be a JSON object or array".to_string(),
                })
            }
        };

        if self.require_message {
            let has_message = payload
                .as_ref()
                .and_then(|p| p.get("message"))
                .and_then(Value::as_str)
                .is_some_and(|m| !m.trim().is_empty());
            if !has_message {
                return Err(FleetError::InvalidRequest {
                    reason: "message must be a non-empty string".to_string(),
                });
            }
        }

        Ok(payload.unwrap_or_else(|| json!({ "message": "" })))
    }
}
