//! Typed access to the dashboard API

use anyhow::{anyhow, Context, Result};
use fleet_core::{endpoints, Agent, AgentView, ContainerAction, MemoryTotals, StatusCounts};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub ok: bool,
    pub time: String,
    pub docker_available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentList {
    pub agents: Vec<AgentView>,
    pub docker_available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub counts: StatusCounts,
    #[serde(default)]
    pub ram: MemoryTotals,
    pub docker_available: bool,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logs {
    pub logs: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReceipt {
    pub dispatch_id: String,
}

/// Body of a successful template update; `agent` is the stored record.
#[derive(Debug, Deserialize)]
pub struct TemplateUpdated {
    pub agent: Agent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCompleted {
    pub agent_id: String,
    pub action: ContainerAction,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct FleetClient {
    base_url: String,
    http: Client,
}

impl FleetClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Absolute URL for an endpoint template, substituting `{id}`.
    pub fn url(&self, endpoint: &str, id: Option<&str>) -> String {
        let path = match id {
            Some(id) => endpoint.replace("{id}", id),
            None => endpoint.to_string(),
        };
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<Health> {
        self.get(&self.url(endpoints::HEALTH, None)).await
    }

    pub async fn agents(&self) -> Result<AgentList> {
        self.get(&self.url(endpoints::AGENTS, None)).await
    }

    pub async fn metrics(&self) -> Result<Metrics> {
        self.get(&self.url(endpoints::METRICS, None)).await
    }

    pub async fn logs(&self, id: &str, lines: Option<u32>) -> Result<Logs> {
        let mut url = self.url(endpoints::AGENT_LOGS, Some(id));
        if let Some(lines) = lines {
            url = format!("{url}?lines={lines}");
        }
        self.get(&url).await
    }

    pub async fn dispatch(&self, id: &str, payload: &Value) -> Result<DispatchReceipt> {
        let url = self.url(endpoints::AGENT_DISPATCH, Some(id));
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        decode(response).await
    }

    pub async fn set_template(&self, id: &str, template: &str) -> Result<Agent> {
        let url = self.url(endpoints::AGENT_TEMPLATE, Some(id));
        let response = self
            .http
            .patch(&url)
            .json(&json!({ "template": template }))
            .send()
            .await
            .with_context(|| format!("PATCH {url}"))?;
        decode::<TemplateUpdated>(response)
            .await
            .map(|updated| updated.agent)
    }

    pub async fn act(&self, id: &str, action: ContainerAction) -> Result<ActionCompleted> {
        let url = self.url(endpoints::AGENT_ACTIONS, Some(id));
        let response = self
            .http
            .post(&url)
            .json(&json!({ "action": action }))
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("unexpected response body");
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    Err(anyhow!("{} ({})", message, status.as_u16()))
}
