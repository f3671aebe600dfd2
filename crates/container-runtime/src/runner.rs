//! Process execution behind a trait so the adapter can be driven by a
//! scripted runner in tests.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::RuntimeError;

/// Hard limit for every runtime invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum bytes accepted from either output stream.
pub const DEFAULT_MAX_OUTPUT: usize = 5 * 1024 * 1024;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// A non-zero exit is reported through [`CommandOutput::code`], not as an
    /// error. Errors cover spawning, timeouts and oversized output.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RuntimeError>;
}

/// Production runner using tokio processes.
///
/// The child is killed when the timeout fires or an output stream grows
/// past the cap.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
    max_output: usize,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration, max_output: usize) -> Self {
        Self {
            timeout,
            max_output,
        }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_OUTPUT)
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RuntimeError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output;

        let finished = tokio::time::timeout(self.timeout, async {
            let (stdout, stderr) =
                tokio::try_join!(read_capped(stdout, limit), read_capped(stderr, limit))?;
            let status = child.wait().await?;
            Ok::<_, RuntimeError>(CommandOutput {
                code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            })
        })
        .await;

        match finished {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                let _ = child.kill().await;
                Err(err)
            }
            Err(_) => {
                let _ = child.kill().await;
                Err(RuntimeError::TimedOut {
                    program: program.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

async fn read_capped<R>(reader: Option<R>, limit: usize) -> Result<Vec<u8>, RuntimeError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    }
    if buf.len() > limit {
        return Err(RuntimeError::OutputTooLarge { limit });
    }
    Ok(buf)
}
