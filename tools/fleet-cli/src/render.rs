//! Plain-text rendering of API responses

use fleet_core::{AgentView, MemoryTotals, StatusCounts};

const DASH: &str = "-";

/// One row per agent, columns padded to the widest value.
pub fn agent_table(agents: &[AgentView]) -> String {
    let header = ["ID", "NAME", "CONTAINER", "STATUS", "UPTIME", "RESTARTS", "MEMORY"];
    let rows: Vec<[String; 7]> = agents
        .iter()
        .map(|view| {
            [
                view.agent.id.clone(),
                or_dash(view.agent.name()),
                or_dash(view.agent.container_ref()),
                view.status.clone(),
                or_dash(view.uptime.as_deref()),
                view.restart_count
                    .map_or_else(|| DASH.to_string(), |n| n.to_string()),
                or_dash(view.memory_usage.as_deref()),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = format_row(&header.map(String::from), &widths);
    for row in &rows {
        out.push('\n');
        out.push_str(&format_row(row, &widths));
    }
    out
}

pub fn summary(counts: &StatusCounts, docker_available: bool) -> String {
    let runtime = if docker_available { "available" } else { "unavailable" };
    format!(
        "runtime: {runtime}\nagents: {} total, {} running, {} stopped, {} error, {} other",
        counts.total, counts.running, counts.stopped, counts.error, counts.other
    )
}

pub fn memory(totals: &MemoryTotals) -> String {
    format!("memory: {:.1} MiB used of {:.1} MiB", totals.used_mb, totals.limit_mb)
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or(DASH).to_string()
}

fn format_row(cells: &[String; 7], widths: &[usize; 7]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
