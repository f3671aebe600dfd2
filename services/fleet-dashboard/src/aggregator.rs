//! Status aggregation: registry agents joined with one runtime snapshot

use chrono::Utc;
use container_runtime::ContainerRuntime;
use fleet_core::{build_views, container_refs, Agent, FleetStatus};
use tracing::debug;

/// Enrich `agents` with live runtime state.
///
/// Issues at most one availability check, one `inspect` and one `stats` call regardless
/// of fleet size, and none beyond the check when the runtime is down.
pub async fn aggregate(runtime: &ContainerRuntime, agents: Vec<Agent>) -> FleetStatus {
    let refs = container_refs(&agents);
    let snapshot = runtime.snapshot(&refs).await;
    debug!(
        agents = agents.len(),
        containers = refs.len(),
        available = snapshot.is_available(),
        "aggregated fleet status"
    );

    FleetStatus {
        docker_available: snapshot.is_available(),
        agents: build_views(agents, &snapshot, Utc::now()),
    }
}
