//! The agent registry document: `{ "agents": [...] }`

use fleet_core::{Agent, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::document::{read_document, write_document};

#[derive(Serialize)]
struct AgentDocument<'a> {
    agents: &'a [Agent],
}

/// Flat list of agents in one JSON file. Cloning shares the document lock.
///
/// Entries are kept as written. Updates patch single keys in the raw
/// document so everything else (key order, `null`s, unknown fields, even
/// entries that are not valid agents) is written back unchanged.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl AgentRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All agents. A missing file is an empty registry; a document whose
    /// `agents` is not an array is treated the same way. Entries without a
    /// string `id` are skipped.
    pub async fn load(&self) -> Result<Vec<Agent>> {
        let _guard = self.lock.lock().await;
        let Some(document) = read_document::<Value>(&self.path).await? else {
            return Ok(Vec::new());
        };
        Ok(entries(&document)
            .iter()
            .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                Ok(agent) => Some(agent),
                Err(err) => {
                    warn!(error = %err, "skipping registry entry");
                    None
                }
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Agent>> {
        Ok(self.load().await?.into_iter().find(|agent| agent.id == id))
    }

    /// Replace the whole document.
    pub async fn save(&self, agents: &[Agent]) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_document(&self.path, &AgentDocument { agents }).await
    }

    /// Set one agent's template. Returns `None`, without writing, when the id
    /// is unknown.
    #[instrument(skip(self, template), fields(path = %self.path.display()))]
    pub async fn update_template(&self, id: &str, template: &str) -> Result<Option<Agent>> {
        let _guard = self.lock.lock().await;
        let Some(mut document) = read_document::<Value>(&self.path).await? else {
            debug!("template update without a registry document");
            return Ok(None);
        };

        let Some(entry) = entries_mut(&mut document)
            .and_then(|entries| entries.iter_mut().find(|entry| entry_id(entry) == Some(id)))
            .and_then(Value::as_object_mut)
        else {
            debug!("template update for unknown agent");
            return Ok(None);
        };
        entry.insert("template".to_string(), Value::String(template.to_string()));
        let updated: Agent = serde_json::from_value(Value::Object(entry.clone()))?;

        write_document(&self.path, &document).await?;
        info!(agent_id = %id, bytes = template.len(), "template updated");
        Ok(Some(updated))
    }
}

fn entries(document: &Value) -> &[Value] {
    document
        .get("agents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn entries_mut(document: &mut Value) -> Option<&mut Vec<Value>> {
    document.get_mut("agents").and_then(Value::as_array_mut)
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::FleetError;
    use serde_json::json;
    use tokio_test::assert_ok;

    const DOCUMENT: &str = r#"{
  "agents": [
    {
      "id": "a1",
      "name": "Scout",
      "description": "Watches the edge",
      "container": "c1",
      "template": "v1"
    },
    {
      "id": "a2",
      "name": "Courier",
      "owner": "ops"
    }
  ]
}
"#;

    fn registry_with(contents: &str) -> (tempfile::TempDir, AgentRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        std::fs::write(&path, contents).unwrap();
        (dir, AgentRegistry::new(path))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AgentRegistry::new(dir.path().join("agents.json"));

        assert!(assert_ok!(registry.load().await).is_empty());
    }

    #[tokio::test]
    async fn test_non_array_agents_is_empty() {
        let (_dir, registry) = registry_with(r#"{ "agents": { "a1": {} } }"#);
        assert!(assert_ok!(registry.load().await).is_empty());
    }

    #[tokio::test]
    async fn test_loosely_typed_entries_still_load() {
        let (_dir, registry) = registry_with(
            r#"{ "agents": [ { "id": "a1", "name": 7 }, { "id": "a2" }, { "name": "no id" } ] }"#,
        );

        let agents = assert_ok!(registry.load().await);

        let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);
        assert_eq!(agents[0].name(), None);
        assert_eq!(agents[0].fields.get("name"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn test_update_template_only_touches_template() {
        const LOOSE: &str = r#"{
  "agents": [
    {
      "id": "a1",
      "zone": "eu-west",
      "container": "c1",
      "name": null,
      "template": "v1"
    },
    {
      "name": "entry without id",
      "priority": 2
    },
    {
      "id": "a2",
      "description": 42
    }
  ],
  "revision": 3
}
"#;
        let (_dir, registry) = registry_with(LOOSE);

        assert_ok!(registry.update_template("a1", "v2").await);
        let raw = std::fs::read_to_string(registry.path()).unwrap();
        assert_eq!(raw, LOOSE.replace(r#""template": "v1""#, r#""template": "v2""#));

        assert_ok!(registry.update_template("a2", "fresh").await);
        let raw = std::fs::read_to_string(registry.path()).unwrap();
        assert!(raw.contains("\"description\": 42,\n      \"template\": \"fresh\"\n"));
        assert!(raw.ends_with("\"revision\": 3\n}\n"));
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let (_dir, registry) = registry_with("{ \"agents\": [");
        let err = registry.load().await.unwrap_err();
        assert!(matches!(err, FleetError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let (_dir, registry) = registry_with(DOCUMENT);

        let agents = assert_ok!(registry.load().await);
        assert_ok!(registry.save(&agents).await);

        let raw = std::fs::read_to_string(registry.path()).unwrap();
        assert_eq!(raw, DOCUMENT);
        assert_eq!(assert_ok!(registry.load().await), agents);
    }

    #[tokio::test]
    async fn test_update_template() {
        let (_dir, registry) = registry_with(DOCUMENT);

        let updated = assert_ok!(registry.update_template("a2", "hello {{name}}").await);

        let updated = updated.expect("a2 exists");
        assert_eq!(updated.template(), Some("hello {{name}}"));
        assert_eq!(updated.fields.get("owner"), Some(&json!("ops")));

        let reloaded = assert_ok!(registry.get("a2").await).unwrap();
        assert_eq!(reloaded, updated);
        let untouched = assert_ok!(registry.get("a1").await).unwrap();
        assert_eq!(untouched.template(), Some("v1"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_does_not_write() {
        let (_dir, registry) = registry_with(DOCUMENT);
        let before = std::fs::metadata(registry.path()).unwrap().modified().unwrap();

        let updated = assert_ok!(registry.update_template("ghost", "x").await);

        assert!(updated.is_none());
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), DOCUMENT);
        let after = std::fs::metadata(registry.path()).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AgentRegistry::new(dir.path().join("agents.json"));
        let agents: Vec<Agent> = (0..16).map(|i| Agent::new(format!("a{i}"))).collect();
        assert_ok!(registry.save(&agents).await);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .update_template(&format!("a{i}"), &format!("t{i}"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }

        for (i, agent) in assert_ok!(registry.load().await).iter().enumerate() {
            assert_eq!(agent.template(), Some(format!("t{i}").as_str()));
        }
    }
}
