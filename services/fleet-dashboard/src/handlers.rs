//! Route handlers for the dashboard API

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use fleet_core::{
    clamp_log_lines, Agent, AgentView, ContainerAction, FleetError, MemoryTotals, StatusCounts,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::aggregator::aggregate;
use crate::error::ApiError;
use crate::DashboardState;

type ApiResult<T> = Result<T, ApiError>;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    ok: bool,
    time: String,
    docker_available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsResponse {
    agents: Vec<AgentView>,
    docker_available: bool,
    updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    counts: StatusCounts,
    ram: MemoryTotals,
    docker_available: bool,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    lines: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    agent_id: String,
    lines: u32,
    logs: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchAccepted {
    accepted: bool,
    dispatch_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCompleted {
    ok: bool,
    agent_id: String,
    action: ContainerAction,
}

#[derive(Serialize)]
pub struct TemplateUpdated {
    ok: bool,
    agent: Agent,
}

/// Whether the request declares `application/json`, ignoring parameters.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Parse an optional JSON body. Bodies that are empty or not declared as
/// JSON are treated as absent.
fn json_body(headers: &HeaderMap, body: &Bytes) -> Result<Option<Value>, FleetError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| FleetError::InvalidRequest {
            reason: format!("invalid JSON body: {err}"),
        })
}

#[instrument(skip(state))]
pub async fn health(State(state): State<Arc<DashboardState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: timestamp(),
        docker_available: state.runtime.is_available().await,
    })
}

#[instrument(skip(state))]
pub async fn list_agents(State(state): State<Arc<DashboardState>>) -> ApiResult<Json<AgentsResponse>> {
    let agents = state.registry.load().await?;
    let fleet = aggregate(&state.runtime, agents).await;

    Ok(Json(AgentsResponse {
        agents: fleet.agents,
        docker_available: fleet.docker_available,
        updated_at: timestamp(),
    }))
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<Arc<DashboardState>>) -> ApiResult<Json<MetricsResponse>> {
    let agents = state.registry.load().await?;
    let fleet = aggregate(&state.runtime, agents).await;

    Ok(Json(MetricsResponse {
        counts: StatusCounts::tally(&fleet.agents),
        ram: MemoryTotals::tally(&fleet.agents),
        docker_available: fleet.docker_available,
        updated_at: timestamp(),
    }))
}

/// The agent and its container, once the runtime is known to be reachable.
async fn runnable_agent(state: &DashboardState, id: &str) -> ApiResult<(Agent, String)> {
    let agent = state
        .registry
        .get(id)
        .await?
        .ok_or_else(|| FleetError::agent_not_found(id))?;
    let container = agent
        .container_ref()
        .map(str::to_owned)
        .ok_or_else(|| FleetError::NoContainer {
            agent_id: agent.id.clone(),
        })?;
    if !state.runtime.is_available().await {
        return Err(FleetError::RuntimeUnavailable.into());
    }
    Ok((agent, container))
}

#[instrument(skip(state))]
pub async fn agent_logs(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<LogsResponse>> {
    let (agent, container) = runnable_agent(&state, &id).await?;

    let lines = clamp_log_lines(query.lines.as_deref());
    let logs = state
        .runtime
        .logs(&container, lines)
        .await
        .map_err(|err| FleetError::RuntimeFailure {
            reason: err.to_string(),
        })?;

    Ok(Json(LogsResponse {
        agent_id: agent.id.clone(),
        lines,
        logs,
    }))
}

#[instrument(skip(state, headers, body))]
pub async fn dispatch(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<DispatchAccepted>)> {
    let agent = state
        .registry
        .get(&id)
        .await?
        .ok_or_else(|| FleetError::agent_not_found(&id))?;

    let payload = state.payload_policy.accept(json_body(&headers, &body)?)?;
    let dispatch = state.dispatches.create(&agent.id, payload).await?;
    info!(agent_id = %agent.id, dispatch_id = %dispatch.id, "dispatch accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DispatchAccepted {
            accepted: true,
            dispatch_id: dispatch.id.to_string(),
        }),
    ))
}

#[instrument(skip(state, headers, body))]
pub async fn update_template(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<TemplateUpdated>> {
    let template = json_body(&headers, &body)
        .ok()
        .flatten()
        .and_then(|value| value.get("template").and_then(Value::as_str).map(str::to_owned))
        .ok_or_else(|| FleetError::InvalidRequest {
            reason: "template must be a string".to_string(),
        })?;

    let agent = state
        .registry
        .update_template(&id, &template)
        .await?
        .ok_or_else(|| FleetError::agent_not_found(&id))?;

    Ok(Json(TemplateUpdated { ok: true, agent }))
}

#[instrument(skip(state, headers, body))]
pub async fn container_action(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ActionCompleted>> {
    let action = json_body(&headers, &body)?
        .as_ref()
        .and_then(|value| value.get("action"))
        .and_then(Value::as_str)
        .and_then(ContainerAction::parse)
        .ok_or_else(|| FleetError::InvalidRequest {
            reason: "unsupported action".to_string(),
        })?;

    let (agent, container) = runnable_agent(&state, &id).await?;
    state
        .runtime
        .act(&container, action)
        .await
        .map_err(|err| FleetError::ActionFailed {
            action: action.to_string(),
            reason: err.to_string(),
        })?;
    info!(agent_id = %agent.id, %action, "container action accepted");

    Ok(Json(ActionCompleted {
        ok: true,
        agent_id: agent.id,
        action,
    }))
}
