//! Agent records and the views derived from them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by [`AgentView`]; stale copies in the stored record are dropped.
const DERIVED_KEYS: [&str; 4] = ["status", "uptime", "restartCount", "memoryUsage"];

/// An agent as stored in the registry document.
///
/// Only `id` is typed. Every other field stays as written, in document
/// order, so values of unexpected types (or `null`) survive a load/save
/// cycle and never make the registry unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_container(self, container: impl Into<String>) -> Self {
        self.with_field("container", container.into())
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn template(&self) -> Option<&str> {
        self.text("template")
    }

    /// The container reference, if one is configured as a non-empty string.
    pub fn container_ref(&self) -> Option<&str> {
        self.text("container").filter(|c| !c.is_empty())
    }
}

/// An agent enriched with live runtime state. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub status: String,
    pub uptime: Option<String>,
    pub restart_count: Option<u64>,
    pub memory_usage: Option<String>,
}

impl AgentView {
    /// A view with only a status and no runtime details.
    pub fn bare(agent: Agent, status: impl Into<String>) -> Self {
        Self::new(agent, status.into(), None, None, None)
    }

    pub fn new(
        mut agent: Agent,
        status: String,
        uptime: Option<String>,
        restart_count: Option<u64>,
        memory_usage: Option<String>,
    ) -> Self {
        agent
            .fields
            .retain(|key, _| !DERIVED_KEYS.contains(&key.as_str()));
        Self {
            agent,
            status,
            uptime,
            restart_count,
            memory_usage,
        }
    }
}

/// Result of one aggregation pass over the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetStatus {
    pub docker_available: bool,
    pub agents: Vec<AgentView>,
}

/// Agent counts grouped by normalised runtime state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
    pub error: usize,
    pub other: usize,
}

impl StatusCounts {
    pub fn tally(views: &[AgentView]) -> Self {
        let mut counts = Self {
            total: views.len(),
            ..Self::default()
        };
        for view in views {
            match view.status.to_ascii_lowercase().as_str() {
                "running" => counts.running += 1,
                "exited" | "dead" | "created" => counts.stopped += 1,
                "restarting" | "paused" => counts.error += 1,
                _ => counts.other += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "a1",
            "name": "Scout",
            "container": "c1",
            "owner": "ops",
            "tags": ["edge"]
        });

        let agent: Agent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(agent.container_ref(), Some("c1"));
        assert_eq!(agent.name(), Some("Scout"));
        assert_eq!(agent.fields.get("owner"), Some(&json!("ops")));
        assert_eq!(serde_json::to_value(&agent).unwrap(), raw);
    }

    #[test]
    fn test_loose_fields_keep_their_values_and_order() {
        let raw = r#"{"id":"a1","zone":"eu","name":null,"container":7,"template":"v1"}"#;

        let agent: Agent = serde_json::from_str(raw).unwrap();

        assert_eq!(agent.name(), None);
        assert_eq!(agent.container_ref(), None);
        assert_eq!(agent.template(), Some("v1"));
        assert_eq!(serde_json::to_string(&agent).unwrap(), raw);
    }

    #[test]
    fn test_empty_container_is_not_a_reference() {
        let agent = Agent::new("a1").with_container("");
        assert_eq!(agent.container_ref(), None);
    }

    #[test]
    fn test_view_serializes_camel_case_with_nulls() {
        let view = AgentView::bare(Agent::new("a1"), "unknown");
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "status": "unknown",
                "uptime": null,
                "restartCount": null,
                "memoryUsage": null
            })
        );
    }

    #[test]
    fn test_view_drops_stale_derived_fields() {
        let mut agent = Agent::new("a1");
        agent.fields.insert("status".to_string(), json!("running"));
        let view = AgentView::bare(agent, "unavailable");

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["status"], "unavailable");
    }

    #[test]
    fn test_status_counts() {
        let views: Vec<AgentView> = ["running", "exited", "paused", "unknown", "Running"]
            .iter()
            .enumerate()
            .map(|(i, s)| AgentView::bare(Agent::new(format!("a{i}")), *s))
            .collect();

        let counts = StatusCounts::tally(&views);
        assert_eq!(
            counts,
            StatusCounts {
                total: 5,
                running: 2,
                stopped: 1,
                error: 1,
                other: 1,
            }
        );
    }
}
