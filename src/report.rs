use crate::{
    decode::{DecodeWarning, Decoded, DecodedResult},
    engine::{ExecutableResolver, Invocation, RuntimeMode, Worker},
    operation::Operation,
    util::hash_file,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Printed by the CLI after every operation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub operation: String,
    pub worker: Worker,
    pub mode: RuntimeMode,
    pub args: Vec<String>,
    pub started: String,
    pub finished: String,
    pub duration_ms: u128,
    pub result: DecodedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<DecodeWarning>,
}

impl RunReport {
    pub fn new(
        operation: Operation,
        mode: RuntimeMode,
        invocation: &Invocation,
        started: String,
        finished: String,
        elapsed: Duration,
        decoded: Decoded,
    ) -> Self {
        Self {
            operation: operation.to_string(),
            worker: invocation.worker,
            mode,
            args: invocation.display_args(),
            started,
            finished,
            duration_ms: elapsed.as_millis(),
            result: decoded.result,
            warning: decoded.warning,
        }
    }
}

/// One row of `doctor` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerDiag {
    pub worker: Worker,
    pub path: String,
    pub exists: bool,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub mode: RuntimeMode,
    #[serde(default)]
    pub interpreter: Option<String>,
    pub workers: Vec<WorkerDiag>,
    pub ok: bool,
}

impl DoctorReport {
    /// Check every worker (and the interpreter in source mode) without running anything.
    pub fn collect(resolver: &ExecutableResolver) -> Self {
        let mode = resolver.mode();
        let interpreter = match mode {
            RuntimeMode::Source => Some(resolver.interpreter_path()),
            RuntimeMode::Packaged => None,
        };
        let mut ok = interpreter.as_ref().is_none_or(|p| p.is_file());

        let mut workers = Vec::with_capacity(Worker::ALL.len());
        for worker in Worker::ALL {
            let path = resolver.executable_path(worker);
            let exists = path.is_file();
            let (sha256, error) = if exists {
                match hash_file(&path) {
                    Ok(h) => (Some(h), None),
                    Err(e) => (None, Some(format!("{e:#}"))),
                }
            } else {
                warn!("{} missing at {}", worker, path.display());
                (None, Some("not found".to_string()))
            };
            ok &= sha256.is_some();
            workers.push(WorkerDiag {
                worker,
                path: path.display().to_string(),
                exists,
                sha256,
                error,
            });
        }

        Self {
            mode,
            interpreter: interpreter.map(|p| p.display().to_string()),
            workers,
            ok,
        }
    }
}
