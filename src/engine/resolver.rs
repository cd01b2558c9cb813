use super::types::{Invocation, Worker};
use crate::config::Config;
use crate::error::{Result, SidecarError};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How workers are shipped: scripts run by a local interpreter, or standalone binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    Source,
    Packaged,
}

impl RuntimeMode {
    /// Resolve the configured mode once at startup.
    ///
    /// `auto` picks `Packaged` when the packaged binaries directory exists.
    pub fn from_setting(raw: &str, layout: &WorkerLayout) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(RuntimeMode::Source),
            "packaged" => Ok(RuntimeMode::Packaged),
            "" | "auto" => {
                if layout.binaries_dir().is_dir() {
                    Ok(RuntimeMode::Packaged)
                } else {
                    Ok(RuntimeMode::Source)
                }
            }
            other => Err(anyhow!("unknown runtime.mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Unix => "",
        }
    }
}

/// Where workers live on disk.
#[derive(Debug, Clone)]
pub struct WorkerLayout {
    pub sidecars_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub resources_dir: PathBuf,
}

impl WorkerLayout {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let resources_dir = if cfg.paths.resources_dir.is_empty() {
            let exe = std::env::current_exe().with_context(|| "current_exe")?;
            let dir = exe
                .parent()
                .ok_or_else(|| anyhow!("executable has no parent dir: {}", exe.display()))?;
            dir.join("resources")
        } else {
            PathBuf::from(&cfg.paths.resources_dir)
        };
        Ok(Self {
            sidecars_dir: PathBuf::from(&cfg.paths.sidecars_dir),
            venv_dir: PathBuf::from(&cfg.paths.venv_dir),
            resources_dir,
        })
    }

    pub fn binaries_dir(&self) -> PathBuf {
        self.resources_dir.join("bin")
    }
}

pub struct ExecutableResolver {
    mode: RuntimeMode,
    platform: Platform,
    layout: WorkerLayout,
}

impl ExecutableResolver {
    pub fn new(mode: RuntimeMode, layout: WorkerLayout) -> Self {
        Self {
            mode,
            platform: Platform::current(),
            layout,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn interpreter_path(&self) -> PathBuf {
        match self.platform {
            Platform::Windows => self.layout.venv_dir.join("Scripts").join("python.exe"),
            Platform::Unix => self.layout.venv_dir.join("bin").join("python"),
        }
    }

    pub fn script_path(&self, worker: Worker) -> PathBuf {
        self.layout.sidecars_dir.join(format!("{}.py", worker.name()))
    }

    pub fn binary_path(&self, worker: Worker) -> PathBuf {
        self.layout
            .binaries_dir()
            .join(format!("{}{}", worker.name(), self.platform.exe_suffix()))
    }

    /// The path that must exist for `worker` to run in the active mode.
    pub fn executable_path(&self, worker: Worker) -> PathBuf {
        match self.mode {
            RuntimeMode::Source => self.script_path(worker),
            RuntimeMode::Packaged => self.binary_path(worker),
        }
    }

    /// Build the invocation for `worker` with its operation arguments appended.
    pub fn invocation(&self, worker: Worker, args: Vec<OsString>) -> Result<Invocation> {
        let inv = match self.mode {
            RuntimeMode::Source => {
                let interpreter = self.interpreter_path();
                require(worker, "interpreter", &interpreter)?;
                let script = self.script_path(worker);
                require(worker, "script", &script)?;

                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(script.into_os_string());
                full.extend(args);
                Invocation {
                    worker,
                    command: interpreter,
                    args: full,
                    // Runs in the caller's cwd; relative layout and input paths resolve there.
                    working_dir: None,
                }
            }
            RuntimeMode::Packaged => {
                let binary = self.binary_path(worker);
                require(worker, "binary", &binary)?;
                Invocation {
                    worker,
                    command: binary,
                    args,
                    working_dir: None,
                }
            }
        };
        debug!("resolved {} -> {}", worker, inv.command.display());
        Ok(inv)
    }
}

fn require(worker: Worker, what: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SidecarError::Resolution {
            worker: worker.name().to_string(),
            what,
            path: path.to_path_buf(),
        })
    }
}
