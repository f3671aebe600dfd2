//! The dispatch log document: `{ "items": [...] }`

use fleet_core::{Dispatch, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::document::{read_document, write_document};

/// Existing items stay opaque so older records never block an append.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DispatchDocument {
    #[serde(default)]
    items: Vec<Value>,
}

/// Append-only log of dispatches. Cloning shares the document lock.
#[derive(Debug, Clone)]
pub struct DispatchLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DispatchLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a dispatch for `agent_id`, creating the document if needed.
    #[instrument(skip(self, payload), fields(path = %self.path.display()))]
    pub async fn create(&self, agent_id: &str, payload: Value) -> Result<Dispatch> {
        let _guard = self.lock.lock().await;

        let mut document = match read_document::<DispatchDocument>(&self.path).await? {
            Some(document) => document,
            None => {
                let empty = DispatchDocument::default();
                write_document(&self.path, &empty).await?;
                empty
            }
        };

        let dispatch = Dispatch::new(agent_id, payload);
        document.items.push(serde_json::to_value(&dispatch)?);
        write_document(&self.path, &document).await?;

        info!(dispatch_id = %dispatch.id, agent_id, total = document.items.len(), "dispatch recorded");
        Ok(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn items(log: &DispatchLog) -> Vec<Value> {
        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert!(raw.ends_with("}\n"));
        let document: Value = serde_json::from_str(&raw).unwrap();
        document["items"].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_initialises_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let log = DispatchLog::new(dir.path().join("data/dispatches.json"));

        let dispatch = assert_ok!(log.create("a1", json!({ "message": "go" })).await);

        let stored = items(&log);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["id"], dispatch.id.to_string());
        assert_eq!(stored[0]["agentId"], "a1");
        assert_eq!(stored[0]["payload"], json!({ "message": "go" }));
    }

    #[tokio::test]
    async fn test_create_appends_and_keeps_existing_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatches.json");
        std::fs::write(&path, r#"{ "items": [ { "legacy": true } ] }"#).unwrap();
        let log = DispatchLog::new(path);

        let first = assert_ok!(log.create("a1", json!({ "message": "one" })).await);
        let second = assert_ok!(log.create("a2", json!({ "message": "two" })).await);

        assert_ne!(first.id, second.id);
        let stored = items(&log);
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], json!({ "legacy": true }));
        assert_eq!(stored[2]["agentId"], "a2");
    }

    #[tokio::test]
    async fn test_concurrent_appends_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let log = DispatchLog::new(dir.path().join("dispatches.json"));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.create("a1", json!({ "n": i })).await })
            })
            .collect();
        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }

        assert_eq!(items(&log).len(), 20);
    }
}
