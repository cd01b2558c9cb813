use super::{
    types::{Invocation, ProcessOutcome, Worker},
    Runner,
};
use crate::config::Config;
use crate::error::{Result, SidecarError};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawns one worker per call and captures both output streams in full.
pub struct ProcessRunner {
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    permits: Option<Arc<Semaphore>>,
    echo_output: bool,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// No timeout, no concurrency cap, no extra environment.
    pub fn new() -> Self {
        Self {
            env: BTreeMap::new(),
            timeout: None,
            permits: None,
            echo_output: false,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let timeout = match cfg.limits.worker_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            env: cfg.workers.env.clone(),
            timeout,
            permits: None,
            echo_output: cfg.debug.echo_worker_output,
        }
        .with_max_concurrent(cfg.limits.max_concurrent_workers)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound the number of workers running at once. Zero means unbounded.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl Runner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutcome> {
        let worker = invocation.worker;

        // Held until the child has exited and both pipes are drained.
        let _permit = match &self.permits {
            Some(sem) => sem.clone().acquire_owned().await.ok(),
            None => None,
        };

        debug!(
            "spawn {} {:?} timeout={:?}",
            invocation.command.display(),
            invocation.display_args(),
            self.timeout
        );

        let mut cmd = Command::new(&invocation.command);
        cmd.args(&invocation.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let mut child = cmd.spawn().map_err(|source| SidecarError::Spawn {
            command: invocation.command.clone(),
            source,
        })?;

        // Both pipes are drained from the moment of spawn so a chatty worker
        // can never block on a full pipe buffer.
        let echo = self.echo_output;
        let stdout_task = tokio::spawn(drain(child.stdout.take(), worker, "stdout", echo));
        let stderr_task = tokio::spawn(drain(child.stderr.take(), worker, "stderr", echo));

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!("{} timed out after {:?}; killing", worker, limit);
                    if let Err(err) = child.kill().await {
                        warn!("kill {} failed: {err}", worker);
                    }
                    let (_, stderr) = collect(worker, stdout_task, stderr_task).await?;
                    return Err(SidecarError::Timeout {
                        worker: worker.name().to_string(),
                        after: limit,
                        stderr,
                    });
                }
            },
            None => child.wait().await,
        };
        let status = waited.map_err(|source| SidecarError::Capture {
            worker: worker.name().to_string(),
            source,
        })?;

        let (stdout, stderr) = collect(worker, stdout_task, stderr_task).await?;
        debug!(
            "{} exited code={:?} stdout_bytes={} stderr_bytes={}",
            worker,
            status.code(),
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessOutcome {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

async fn drain<R>(
    reader: Option<R>,
    worker: Worker,
    stream: &'static str,
    echo: bool,
) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut acc = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(acc);
    };
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if echo {
            let text = String::from_utf8_lossy(&buf[..n]);
            debug!("[{} {}]: {}", worker, stream, text.trim_end());
        }
        acc.extend_from_slice(&buf[..n]);
    }
    Ok(acc)
}

async fn collect(
    worker: Worker,
    stdout_task: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<(String, String)> {
    let capture = |source: std::io::Error| SidecarError::Capture {
        worker: worker.name().to_string(),
        source,
    };
    let stdout = stdout_task
        .await
        .map_err(|e| capture(std::io::Error::other(e)))?
        .map_err(capture)?;
    let stderr = stderr_task
        .await
        .map_err(|e| capture(std::io::Error::other(e)))?
        .map_err(capture)?;
    Ok((
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}
