//! Parsing of `inspect` and `stats` output

use chrono::{DateTime, Utc};
use fleet_core::{ContainerStatus, STATUS_UNKNOWN};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Go template passed to `stats --format`.
pub const STATS_FORMAT: &str = "{{.Name}}|{{.MemUsage}}";

/// The subset of `inspect` output the dashboard reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<InspectState>,
    /// Kept loose: anything that is not a non-negative integer counts as 0.
    #[serde(default)]
    pub restart_count: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectState {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
}

impl InspectInfo {
    /// Container name without the leading `/` the runtime prints.
    pub fn container_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(|n| n.trim_start_matches('/'))
            .filter(|n| !n.is_empty())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.state.as_ref()?.started_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn restart_count(&self) -> u64 {
        self.restart_count
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn into_status(self, memory_usage: Option<String>) -> ContainerStatus {
        let started_at = self.started_at();
        let restart_count = self.restart_count();
        let status = self
            .state
            .and_then(|s| s.status)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| STATUS_UNKNOWN.to_string());
        ContainerStatus {
            status,
            started_at,
            restart_count,
            memory_usage,
        }
    }
}

/// Parse `inspect` stdout. Empty output means nothing matched.
pub fn parse_inspect(stdout: &str) -> Result<Vec<InspectInfo>, serde_json::Error> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(stdout)
}

/// Pair each requested reference with the record it names.
///
/// A reference matches a container by name (without the leading `/`) or,
/// failing that, by a prefix of its id that no other record shares.
/// References that match nothing are absent from the result.
pub fn match_refs(
    infos: &[InspectInfo],
    refs: &BTreeSet<String>,
) -> HashMap<String, InspectInfo> {
    refs.iter()
        .filter_map(|reference| {
            let by_name = infos
                .iter()
                .find(|info| info.container_name() == Some(reference.as_str()));
            let info = by_name.or_else(|| unique_id_prefix(infos, reference))?;
            Some((reference.clone(), info.clone()))
        })
        .collect()
}

fn unique_id_prefix<'a>(infos: &'a [InspectInfo], reference: &str) -> Option<&'a InspectInfo> {
    let mut matches = infos.iter().filter(|info| {
        info.id
            .as_deref()
            .is_some_and(|id| id.starts_with(reference))
    });
    let first = matches.next()?;
    matches.next().is_none().then_some(first)
}

/// Parse `stats` lines formatted with [`STATS_FORMAT`] into memory usage
/// per container name.
pub fn parse_stats(stdout: &str) -> HashMap<String, Option<String>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (name, memory) = match line.split_once('|') {
                Some((name, memory)) => (name.trim(), Some(memory.trim())),
                None => (line.trim(), None),
            };
            let memory = memory.filter(|m| !m.is_empty()).map(str::to_owned);
            (name.to_string(), memory)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSPECT: &str = r#"[
        {
            "Id": "4f1c0a",
            "Name": "/c1",
            "RestartCount": 2,
            "State": { "Status": "running", "StartedAt": "2026-10-19T10:00:00.123456789Z" }
        },
        {
            "Id": "9a0b",
            "Name": "/c2",
            "RestartCount": "lots",
            "State": { "Status": "exited", "StartedAt": "0001-01-01T00:00:00Z" }
        },
        { "Id": "nameless" }
    ]"#;

    fn refs(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_inspect_records() {
        let infos = parse_inspect(INSPECT).unwrap();
        let matched = match_refs(&infos, &refs(&["c1", "c2"]));

        assert_eq!(matched.len(), 2);
        let c1 = matched["c1"].clone().into_status(Some("45MiB".to_string()));
        assert_eq!(c1.status, "running");
        assert_eq!(c1.restart_count, 2);
        assert_eq!(
            c1.started_at.map(|t| t.to_rfc3339()),
            Some("2026-10-19T10:00:00.123456789+00:00".to_string())
        );
        assert_eq!(c1.memory_usage.as_deref(), Some("45MiB"));

        let c2 = matched["c2"].clone().into_status(None);
        assert_eq!(c2.restart_count, 0);
    }

    #[test]
    fn test_refs_resolve_by_id_prefix() {
        let infos = parse_inspect(INSPECT).unwrap();
        let matched = match_refs(&infos, &refs(&["4f1c", "9a0b", "n", "ghost"]));

        assert_eq!(matched["4f1c"].container_name(), Some("c1"));
        assert_eq!(matched["9a0b"].container_name(), Some("c2"));
        // "n" only prefixes the nameless record
        assert_eq!(matched["n"].container_name(), None);
        assert!(!matched.contains_key("ghost"));
    }

    #[test]
    fn test_ambiguous_id_prefix_matches_nothing() {
        let infos = vec![
            InspectInfo {
                id: Some("abc123".to_string()),
                name: Some("/one".to_string()),
                ..InspectInfo::default()
            },
            InspectInfo {
                id: Some("abc456".to_string()),
                name: Some("/two".to_string()),
                ..InspectInfo::default()
            },
        ];

        let matched = match_refs(&infos, &refs(&["abc", "abc4"]));

        assert!(!matched.contains_key("abc"));
        assert_eq!(matched["abc4"].container_name(), Some("two"));
    }

    #[test]
    fn test_parse_inspect_empty_and_malformed() {
        assert!(parse_inspect("").unwrap().is_empty());
        assert!(parse_inspect("[]\n").unwrap().is_empty());
        assert!(parse_inspect("Error: No such object: ghost").is_err());
    }

    #[test]
    fn test_missing_state_is_unknown() {
        let info = InspectInfo {
            name: Some("/c9".to_string()),
            ..InspectInfo::default()
        };
        let status = info.into_status(None);
        assert_eq!(status.status, "unknown");
        assert_eq!(status.started_at, None);
    }

    #[test]
    fn test_parse_stats_by_name() {
        let stdout = "c1|45MiB / 1.9GiB\nother|1MiB / 1GiB\nc2|\nc3\n\n";

        let stats = parse_stats(stdout);

        assert_eq!(stats.len(), 4);
        assert_eq!(stats["c1"].as_deref(), Some("45MiB / 1.9GiB"));
        assert_eq!(stats["other"].as_deref(), Some("1MiB / 1GiB"));
        assert_eq!(stats["c2"], None);
        assert_eq!(stats["c3"], None);
    }
}
