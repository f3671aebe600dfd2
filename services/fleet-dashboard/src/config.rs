//! Service configuration from flags and environment

use clap::Parser;
use fleet_core::PayloadPolicy;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str =
    "fleet_dashboard=info,container_runtime=info,fleet_store=info,tower_http=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "fleet-dashboard")]
#[command(about = "Fleet Dashboard - agent status, logs, dispatch and templates")]
#[command(version = fleet_core::VERSION)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 4100)]
    pub port: u16,

    /// Agent registry document
    #[arg(long = "agents-config", env = "AGENTS_CONFIG_PATH", default_value = "config/agents.json")]
    pub agents_path: PathBuf,

    /// Dispatch log document
    #[arg(long = "dispatches", env = "DISPATCHES_PATH", default_value = "data/dispatches.json")]
    pub dispatches_path: PathBuf,

    /// Directory served for the browser UI
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Container CLI to invoke
    #[arg(long, env = "DOCKER_CMD", default_value = "docker")]
    pub docker_cmd: String,

    /// Reject dispatches without a non-empty string `message`
    #[arg(long, env = "DISPATCH_REQUIRE_MESSAGE")]
    pub require_dispatch_message: bool,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn payload_policy(&self) -> PayloadPolicy {
        PayloadPolicy {
            require_message: self.require_dispatch_message,
        }
    }
}
