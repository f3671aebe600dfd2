use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("command failed with exit code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("I/O error talking to the runtime: {0}")]
    Io(#[from] std::io::Error),
}
