use clap::{Parser, Subcommand, ValueEnum};
use fleet_core::ContainerAction;
use serde_json::{json, Value};

mod client;
mod render;

use client::FleetClient;

#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(about = "Fleet CLI - Agent status, logs, dispatch and templates")]
#[command(version = fleet_core::VERSION)]
struct Cli {
    /// Dashboard base URL
    #[arg(long, env = "FLEET_URL", default_value = "http://localhost:4100", global = true)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Agent commands
    Agent {
        #[command(subcommand)]
        action: AgentAction,
    },
    /// Service health and runtime availability
    Health,
    /// Agent counts by status
    Status,
}

#[derive(Subcommand, Debug, PartialEq)]
enum AgentAction {
    /// List agents with live status
    List,
    /// Show recent container output
    Logs {
        id: String,
        /// Number of lines (1-1000)
        #[arg(short = 'n', long)]
        lines: Option<u32>,
    },
    /// Send a dispatch to an agent
    Dispatch {
        id: String,
        /// Message to send
        #[arg(short, long, conflicts_with = "payload")]
        message: Option<String>,
        /// Raw JSON payload
        #[arg(long)]
        payload: Option<String>,
    },
    /// Replace an agent's template
    Template { id: String, template: String },
    /// Start, stop or restart an agent's container
    Action { id: String, action: ActionArg },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ActionArg {
    Start,
    Stop,
    Restart,
}

impl From<ActionArg> for ContainerAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Start => Self::Start,
            ActionArg::Stop => Self::Stop,
            ActionArg::Restart => Self::Restart,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = FleetClient::new(&cli.url);

    match cli.command {
        Commands::Agent { action } => handle_agent_action(&client, action).await,
        Commands::Health => handle_health(&client).await,
        Commands::Status => handle_status(&client).await,
    }
}

fn dispatch_payload(message: Option<String>, payload: Option<String>) -> anyhow::Result<Value> {
    match (message, payload) {
        (_, Some(raw)) => Ok(serde_json::from_str(&raw)?),
        (Some(message), None) => Ok(json!({ "message": message })),
        (None, None) => Ok(json!({})),
    }
}

async fn handle_agent_action(client: &FleetClient, action: AgentAction) -> anyhow::Result<()> {
    match action {
        AgentAction::List => {
            let list = client.agents().await?;
            if !list.docker_available {
                eprintln!("container runtime unavailable");
            }
            println!("{}", render::agent_table(&list.agents));
        }
        AgentAction::Logs { id, lines } => {
            let logs = client.logs(&id, lines).await?;
            println!("{}", logs.logs);
        }
        AgentAction::Dispatch {
            id,
            message,
            payload,
        } => {
            let payload = dispatch_payload(message, payload)?;
            let receipt = client.dispatch(&id, &payload).await?;
            println!("dispatch {} accepted for {id}", receipt.dispatch_id);
        }
        AgentAction::Template { id, template } => {
            let agent = client.set_template(&id, &template).await?;
            println!("template updated for {}", agent.id);
        }
        AgentAction::Action { id, action } => {
            let completed = client.act(&id, action.into()).await?;
            println!("{} completed for {}", completed.action, completed.agent_id);
        }
    }
    Ok(())
}

async fn handle_health(client: &FleetClient) -> anyhow::Result<()> {
    let health = client.health().await?;
    println!(
        "ok: {}\nruntime: {}\ntime: {}",
        health.ok,
        if health.docker_available { "available" } else { "unavailable" },
        health.time
    );
    Ok(())
}

async fn handle_status(client: &FleetClient) -> anyhow::Result<()> {
    let metrics = client.metrics().await?;
    println!("{}", render::summary(&metrics.counts, metrics.docker_available));
    println!("{}", render::memory(&metrics.ram));
    println!("updated: {}", metrics.updated_at);
    Ok(())
}
