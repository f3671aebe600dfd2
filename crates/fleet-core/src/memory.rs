//! Memory figures reported by the runtime's `stats` output

use serde::{Deserialize, Serialize};

use crate::agent::AgentView;

const MIB: f64 = 1024.0 * 1024.0;

/// Fleet-wide memory, summed over agents that reported a usage string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTotals {
    pub used_mb: f64,
    pub limit_mb: f64,
}

impl MemoryTotals {
    pub fn tally(views: &[AgentView]) -> Self {
        let (used, limit) = views
            .iter()
            .filter_map(|view| view.memory_usage.as_deref())
            .filter_map(parse_memory_usage)
            .fold((0.0, 0.0), |(used, limit), (u, l)| (used + u, limit + l));
        Self {
            used_mb: round_tenth(used),
            limit_mb: round_tenth(limit),
        }
    }
}

/// Split `"45.3MiB / 1.944GiB"` into used and limit, both in MiB.
pub fn parse_memory_usage(raw: &str) -> Option<(f64, f64)> {
    let (used, limit) = raw.split_once('/')?;
    Some((parse_size(used)? / MIB, parse_size(limit)? / MIB))
}

/// Bytes for a size such as `512KiB`, `1.5GB` or `0B`.
fn parse_size(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let number: f64 = number.parse().ok()?;

    let scale = match unit.trim() {
        "B" | "" => 1.0,
        "KiB" => 1024.0,
        "MiB" => MIB,
        "GiB" => MIB * 1024.0,
        "TiB" => MIB * 1024.0 * 1024.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        _ => return None,
    };
    Some(number * scale)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
