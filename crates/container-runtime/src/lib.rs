//! # Container Runtime
//!
//! Adapter over an external container CLI (`docker` or a compatible tool).
//!
//! Every call runs under a hard timeout and an output cap. Failures are
//! folded into degraded results (`false`, empty maps) so a misbehaving
//! runtime never takes the dashboard down. Only the calls an operator asks
//! for directly ([`ContainerRuntime::logs`] and [`ContainerRuntime::act`])
//! report errors to their caller.

mod error;
mod inspect;
mod runner;
mod runtime;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::RuntimeError;
pub use inspect::{
    match_refs, parse_inspect, parse_stats, InspectInfo, InspectState, STATS_FORMAT,
};
pub use runner::{
    CommandOutput, CommandRunner, TokioCommandRunner, DEFAULT_MAX_OUTPUT, DEFAULT_TIMEOUT,
};
pub use runtime::{ContainerRuntime, AVAILABILITY_TTL, STOP_GRACE_SECS};
