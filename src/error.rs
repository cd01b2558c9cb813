//! Error taxonomy for sidecar orchestration.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SidecarError>;

#[derive(Debug, Error)]
pub enum SidecarError {
    /// The expected interpreter, script, or binary is not where the layout says it is.
    /// This is a packaging problem and is never retried.
    #[error("cannot resolve worker {worker}: missing {what} at {}", path.display())]
    Resolution {
        worker: String,
        what: &'static str,
        path: PathBuf,
    },

    /// The OS refused to start the process.
    #[error("failed to spawn {}: {source}", command.display())]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker ran and exited with a nonzero status (or was killed by a signal).
    #[error("worker {worker} failed with {}: {message}", describe_exit(*exit_code))]
    Worker {
        worker: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("worker {worker} exceeded timeout ({after:?}); stderr: {stderr}")]
    Timeout {
        worker: String,
        after: Duration,
        stderr: String,
    },

    /// Reading a pipe or waiting on the child failed after a successful spawn.
    #[error("capturing output of {worker}: {source}")]
    Capture {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    /// A page range produced no valid pages. Callers must not dispatch extraction.
    #[error("invalid page range {input:?} for a {page_count}-page document")]
    InvalidRange { input: String, page_count: u32 },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "a signal".to_string(),
    }
}
