//! Scripted runner for exercising the adapter without a container runtime.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::runner::{CommandOutput, CommandRunner, DEFAULT_TIMEOUT};

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    TimedOut,
}

/// Replies are keyed by subcommand (the first argument, e.g. `inspect`).
/// Every invocation is recorded. Unscripted subcommands behave as if the
/// program were missing.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit 0 with `stdout`.
    pub fn reply(&self, subcommand: &str, stdout: impl Into<String>) {
        self.reply_with(
            subcommand,
            CommandOutput {
                code: Some(0),
                stdout: stdout.into(),
                stderr: String::new(),
            },
        );
    }

    /// Exit with `code` and `stderr`.
    pub fn fail(&self, subcommand: &str, code: i32, stderr: impl Into<String>) {
        self.reply_with(
            subcommand,
            CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.into(),
            },
        );
    }

    pub fn reply_with(&self, subcommand: &str, output: CommandOutput) {
        self.replies
            .lock()
            .insert(subcommand.to_string(), Reply::Output(output));
    }

    pub fn time_out(&self, subcommand: &str) {
        self.replies
            .lock()
            .insert(subcommand.to_string(), Reply::TimedOut);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    /// Number of recorded invocations of `subcommand`.
    pub fn count(&self, subcommand: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RuntimeError> {
        self.calls.lock().push(args.to_vec());

        let subcommand = args.first().cloned().unwrap_or_default();
        let reply = self.replies.lock().get(&subcommand).cloned();
        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::TimedOut) => Err(RuntimeError::TimedOut {
                program: program.to_string(),
                timeout: DEFAULT_TIMEOUT,
            }),
            None => Err(RuntimeError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            }),
        }
    }
}
