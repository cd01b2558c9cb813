use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the external worker programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Worker {
    PdfTools,
    ArchiveTools,
    MediaTools,
    DocTools,
    OcrEngine,
}

impl Worker {
    pub const ALL: [Worker; 5] = [
        Worker::PdfTools,
        Worker::ArchiveTools,
        Worker::MediaTools,
        Worker::DocTools,
        Worker::OcrEngine,
    ];

    /// Base name shared by the script (`<name>.py`) and the packaged binary.
    pub fn name(self) -> &'static str {
        match self {
            Worker::PdfTools => "pdf_tools",
            Worker::ArchiveTools => "archive_tools",
            Worker::MediaTools => "media_tools",
            Worker::DocTools => "doc_tools",
            Worker::OcrEngine => "ocr_engine",
        }
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Worker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches(".py");
        Worker::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| format!("unknown worker: {s}"))
    }
}

/// A fully resolved command line, built fresh for each call.
///
/// Arguments go to the child as a vector; no shell ever sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub worker: Worker,
    pub command: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Argument vector rendered for logs and reports.
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// What a finished worker left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
