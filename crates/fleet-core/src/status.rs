//! Pure status mapping
//!
//! Agent views are a function of the registry and one runtime snapshot.
//! Nothing here touches the runtime or the filesystem.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::agent::{Agent, AgentView};
use crate::container::RuntimeSnapshot;
use crate::{STATUS_UNAVAILABLE, STATUS_UNKNOWN};

pub const DEFAULT_LOG_LINES: u32 = 200;
pub const MIN_LOG_LINES: u32 = 1;
pub const MAX_LOG_LINES: u32 = 1000;

/// Distinct, non-empty container references across `agents`.
pub fn container_refs(agents: &[Agent]) -> BTreeSet<String> {
    agents
        .iter()
        .filter_map(Agent::container_ref)
        .map(str::to_owned)
        .collect()
}

/// Join agents with a runtime snapshot.
pub fn build_views(
    agents: Vec<Agent>,
    snapshot: &RuntimeSnapshot,
    now: DateTime<Utc>,
) -> Vec<AgentView> {
    let containers = match snapshot {
        RuntimeSnapshot::Unavailable => {
            return agents
                .into_iter()
                .map(|agent| AgentView::bare(agent, STATUS_UNAVAILABLE))
                .collect();
        }
        RuntimeSnapshot::Available(containers) => containers,
    };

    agents
        .into_iter()
        .map(|agent| {
            let Some(status) = agent.container_ref().and_then(|c| containers.get(c)) else {
                return AgentView::bare(agent, STATUS_UNKNOWN);
            };
            AgentView::new(
                agent,
                status.status.clone(),
                status.uptime(now),
                Some(status.restart_count),
                status.memory_usage.clone(),
            )
        })
        .collect()
}

/// Compact human uptime: `{d}d {h}h {m}m`, zero units omitted, seconds
/// only when every larger unit is zero. Floors to whole seconds.
pub fn format_uptime(elapsed: Duration) -> Option<String> {
    if elapsed <= Duration::zero() {
        return None;
    }
    let total = elapsed.num_seconds();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    Some(parts.join(" "))
}

/// Clamp a `lines` query value into `[MIN_LOG_LINES, MAX_LOG_LINES]`.
///
/// Reads a leading integer the way a lenient query parser would (`"50abc"`
/// is 50); anything without one falls back to [`DEFAULT_LOG_LINES`].
pub fn clamp_log_lines(raw: Option<&str>) -> u32 {
    let Some(requested) = raw.and_then(leading_integer) else {
        return DEFAULT_LOG_LINES;
    };
    requested.clamp(i64::from(MIN_LOG_LINES), i64::from(MAX_LOG_LINES)) as u32
}

fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate instead of failing on absurdly long inputs
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
