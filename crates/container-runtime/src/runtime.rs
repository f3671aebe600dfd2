//! The container runtime adapter

use fleet_core::{ContainerAction, ContainerStatus, RuntimeSnapshot};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::RuntimeError;
use crate::inspect::{match_refs, parse_inspect, parse_stats, InspectInfo, STATS_FORMAT};
use crate::runner::{CommandOutput, CommandRunner, TokioCommandRunner};

/// How long an availability check result is reused.
pub const AVAILABILITY_TTL: Duration = Duration::from_secs(5);

/// Grace period passed to `stop`/`restart` so the runtime finishes inside
/// the runner's hard timeout.
pub const STOP_GRACE_SECS: u32 = 3;

#[derive(Debug, Clone, Copy)]
struct AvailabilityCheck {
    checked_at: Instant,
    available: bool,
}

pub struct ContainerRuntime {
    program: String,
    runner: Arc<dyn CommandRunner>,
    /// Held across the check so concurrent callers share one result
    availability: Mutex<Option<AvailabilityCheck>>,
    availability_ttl: Duration,
}

impl fmt::Debug for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRuntime")
            .field("program", &self.program)
            .field("availability_ttl", &self.availability_ttl)
            .finish()
    }
}

impl ContainerRuntime {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
            availability: Mutex::new(None),
            availability_ttl: AVAILABILITY_TTL,
        }
    }

    /// Adapter over `program` using the tokio runner with default limits.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self::new(program, Arc::new(TokioCommandRunner::default()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn exec(&self, args: Vec<String>) -> Result<CommandOutput, RuntimeError> {
        debug!(program = %self.program, ?args, "invoking container runtime");
        self.runner.run(&self.program, &args).await
    }

    /// Whether the runtime answers a lightweight check.
    ///
    /// The answer is cached for [`AVAILABILITY_TTL`]; any check failure
    /// counts as unavailable.
    #[instrument(skip(self), fields(program = %self.program))]
    pub async fn is_available(&self) -> bool {
        let mut cached = self.availability.lock().await;
        if let Some(check) = *cached {
            if check.checked_at.elapsed() < self.availability_ttl {
                return check.available;
            }
        }

        let available = match self.exec(vec!["ps".into(), "--quiet".into()]).await {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!(code = ?output.code, stderr = %output.stderr.trim(), "runtime check failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "runtime check failed");
                false
            }
        };

        *cached = Some(AvailabilityCheck {
            checked_at: Instant::now(),
            available,
        });
        available
    }

    /// Inspect records for the given references, keyed by reference.
    ///
    /// References may name a container or a prefix of its id. Unknown
    /// references are absent from the result. The runtime exits non-zero
    /// when any reference is unknown but still prints the others, so stdout
    /// is parsed regardless of the exit code.
    #[instrument(skip(self, refs), fields(count = refs.len()))]
    pub async fn inspect(&self, refs: &BTreeSet<String>) -> HashMap<String, InspectInfo> {
        if refs.is_empty() {
            return HashMap::new();
        }

        let mut args = vec!["inspect".to_string()];
        args.extend(refs.iter().cloned());

        let output = match self.exec(args).await {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "inspect failed");
                return HashMap::new();
            }
        };

        match parse_inspect(&output.stdout) {
            Ok(infos) => match_refs(&infos, refs),
            Err(err) => {
                warn!(error = %err, code = ?output.code, "unparseable inspect output");
                HashMap::new()
            }
        }
    }

    /// Memory usage per running container name; `None` when the runtime
    /// reported no value. Skipped entirely when nothing is referenced.
    #[instrument(skip(self, refs), fields(count = refs.len()))]
    pub async fn stats(&self, refs: &BTreeSet<String>) -> HashMap<String, Option<String>> {
        if refs.is_empty() {
            return HashMap::new();
        }

        let args = ["stats", "--no-stream", "--format", STATS_FORMAT]
            .map(String::from)
            .to_vec();

        match self.exec(args).await {
            Ok(output) if output.success() => parse_stats(&output.stdout),
            Ok(output) => {
                warn!(code = ?output.code, stderr = %output.stderr.trim(), "stats failed");
                HashMap::new()
            }
            Err(err) => {
                warn!(error = %err, "stats failed");
                HashMap::new()
            }
        }
    }

    /// The last `tail` lines of a container's output, stdout then stderr.
    #[instrument(skip(self))]
    pub async fn logs(&self, container: &str, tail: u32) -> Result<String, RuntimeError> {
        let args = vec![
            "logs".to_string(),
            "--tail".to_string(),
            tail.to_string(),
            container.to_string(),
        ];
        let output = self.exec(args).await?;
        if !output.success() {
            return Err(RuntimeError::Failed {
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let text = [output.stdout.trim(), output.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }

    /// Run a lifecycle action against one container.
    #[instrument(skip(self))]
    pub async fn act(&self, container: &str, action: ContainerAction) -> Result<(), RuntimeError> {
        let mut args = vec![action.as_str().to_string()];
        if matches!(action, ContainerAction::Stop | ContainerAction::Restart) {
            args.push("--time".to_string());
            args.push(STOP_GRACE_SECS.to_string());
        }
        args.push(container.to_string());

        let output = self.exec(args).await?;
        if !output.success() {
            return Err(RuntimeError::Failed {
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        info!(container, %action, "container action completed");
        Ok(())
    }

    /// Per-container state from one `inspect` and one `stats` call.
    pub async fn container_states(
        &self,
        refs: &BTreeSet<String>,
    ) -> HashMap<String, ContainerStatus> {
        let (infos, stats) = tokio::join!(self.inspect(refs), self.stats(refs));

        infos
            .into_iter()
            .map(|(reference, info)| {
                let memory = info
                    .container_name()
                    .and_then(|name| stats.get(name).cloned())
                    .flatten();
                (reference, info.into_status(memory))
            })
            .collect()
    }

    /// Everything a listing request needs from the runtime.
    ///
    /// When the check fails no further calls are made.
    pub async fn snapshot(&self, refs: &BTreeSet<String>) -> RuntimeSnapshot {
        if !self.is_available().await {
            return RuntimeSnapshot::Unavailable;
        }
        RuntimeSnapshot::Available(self.container_states(refs).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const INSPECT_C1: &str = r#"[{"Id":"abc","Name":"/c1","RestartCount":2,"State":{"Status":"running","StartedAt":"2026-10-19T10:00:00Z"}}]"#;

    fn refs(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn runtime(runner: &Arc<ScriptedRunner>) -> ContainerRuntime {
        ContainerRuntime::new("docker", runner.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_availability_is_cached_within_window() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.reply("ps", "");
        let runtime = runtime(&runner);

        assert!(runtime.is_available().await);
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(runtime.is_available().await);
        assert_eq!(runner.count("ps"), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(runtime.is_available().await);
        assert_eq!(runner.count("ps"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_check_is_cached_as_unavailable() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("ps", 1, "Cannot connect to the Docker daemon");
        let runtime = runtime(&runner);

        assert!(!runtime.is_available().await);
        assert!(!runtime.is_available().await);
        assert_eq!(runner.count("ps"), 1);
    }

    #[tokio::test]
    async fn test_empty_refs_skip_the_runtime() {
        let runner = Arc::new(ScriptedRunner::new());
        let runtime = runtime(&runner);

        assert!(runtime.inspect(&BTreeSet::new()).await.is_empty());
        assert!(runtime.stats(&BTreeSet::new()).await.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_inspect_tolerates_unknown_refs() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.reply_with(
            "inspect",
            CommandOutput {
                code: Some(1),
                stdout: INSPECT_C1.to_string(),
                stderr: "Error: No such object: ghost".to_string(),
            },
        );
        let runtime = runtime(&runner);

        let infos = runtime.inspect(&refs(&["c1", "ghost"])).await;

        assert_eq!(infos.len(), 1);
        assert!(infos.contains_key("c1"));
        assert_eq!(runner.calls()[0], ["inspect", "c1", "ghost"]);
    }

    #[tokio::test]
    async fn test_id_prefix_reference_gets_memory_by_name() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.reply("inspect", INSPECT_C1);
        runner.reply("stats", "c1|45MiB / 1GiB\n");
        let runtime = runtime(&runner);

        let states = runtime.container_states(&refs(&["ab"])).await;

        assert_eq!(states["ab"].status, "running");
        assert_eq!(states["ab"].memory_usage.as_deref(), Some("45MiB / 1GiB"));
    }

    #[tokio::test]
    async fn test_inspect_failure_is_empty() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.time_out("inspect");
        let runtime = runtime(&runner);

        assert!(runtime.inspect(&refs(&["c1"])).await.is_empty());
    }

    #[tokio::test]
    async fn test_container_states_batches_calls() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.reply("inspect", INSPECT_C1);
        runner.reply("stats", "c1|45MiB / 1GiB\nc2|3MiB / 1GiB\n");
        let runtime = runtime(&runner);

        let states = runtime.container_states(&refs(&["c1", "c2", "c3"])).await;

        assert_eq!(runner.count("inspect"), 1);
        assert_eq!(runner.count("stats"), 1);
        assert_eq!(states.len(), 1);
        let c1 = &states["c1"];
        assert_eq!(c1.status, "running");
        assert_eq!(c1.restart_count, 2);
        assert_eq!(c1.memory_usage.as_deref(), Some("45MiB / 1GiB"));
    }

    #[tokio::test]
    async fn test_snapshot_skips_calls_when_unavailable() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("ps", 1, "daemon down");
        let runtime = runtime(&runner);

        let snapshot = runtime.snapshot(&refs(&["c1"])).await;

        assert_eq!(snapshot, RuntimeSnapshot::Unavailable);
        assert_eq!(runner.count("inspect"), 0);
        assert_eq!(runner.count("stats"), 0);
    }

    #[tokio::test]
    async fn test_logs() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.reply_with(
            "logs",
            CommandOutput {
                code: Some(0),
                stdout: "line one\nline two\n".to_string(),
                stderr: "warn: slow\n".to_string(),
            },
        );
        let runtime = runtime(&runner);

        let logs = runtime.logs("c1", 50).await.unwrap();

        assert_eq!(logs, "line one\nline two\nwarn: slow");
        assert_eq!(runner.calls()[0], ["logs", "--tail", "50", "c1"]);
    }

    #[tokio::test]
    async fn test_actions_pass_a_grace_period_to_stop_and_restart() {
        let runner = Arc::new(ScriptedRunner::new());
        for sub in ["start", "stop", "restart"] {
            runner.reply(sub, "c1\n");
        }
        let runtime = runtime(&runner);

        runtime.act("c1", ContainerAction::Start).await.unwrap();
        runtime.act("c1", ContainerAction::Stop).await.unwrap();
        runtime.act("c1", ContainerAction::Restart).await.unwrap();

        assert_eq!(
            runner.calls(),
            [
                vec!["start", "c1"],
                vec!["stop", "--time", "3", "c1"],
                vec!["restart", "--time", "3", "c1"],
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_action_is_reported() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("start", 1, "Error: No such container: c1");
        let runtime = runtime(&runner);

        let err = runtime.act("c1", ContainerAction::Start).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Failed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_logs_failure_is_reported() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("logs", 1, "Error: No such container: c1");
        let runtime = runtime(&runner);

        let err = runtime.logs("c1", 10).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Failed { code: Some(1), .. }));
    }
}
