//! Result-line protocol: workers may print any amount of progress text, but the
//! last non-empty stdout line carries the machine-readable payload.

use crate::engine::{ProcessOutcome, Worker};
use crate::error::{Result, SidecarError};
use crate::operation::ResultShape;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DecodedResult {
    Unit,
    FilePathList(Vec<PathBuf>),
    Integer(i64),
    RawText(String),
}

/// The worker succeeded but its payload line was unusable; a default was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeWarning {
    pub worker: Worker,
    pub expected: &'static str,
    pub line: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub result: DecodedResult,
    pub warning: Option<DecodeWarning>,
}

impl Decoded {
    fn clean(result: DecodedResult) -> Self {
        Self {
            result,
            warning: None,
        }
    }

    fn degraded(result: DecodedResult, warning: DecodeWarning) -> Self {
        warn!(
            "{} payload not a valid {}: {} (line={:?})",
            warning.worker, warning.expected, warning.reason, warning.line
        );
        Self {
            result,
            warning: Some(warning),
        }
    }
}

/// The last non-empty line of `stdout`, trimmed.
pub fn payload_line(stdout: &str) -> Option<&str> {
    stdout
        .trim_end()
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
}

/// Interpret a finished process. Any exit other than 0 is a [`SidecarError::Worker`].
pub fn decode(worker: Worker, shape: ResultShape, outcome: &ProcessOutcome) -> Result<Decoded> {
    if !outcome.success() {
        let stderr = outcome.stderr.trim();
        let message = if stderr.is_empty() {
            outcome.stdout.trim()
        } else {
            stderr
        };
        return Err(SidecarError::Worker {
            worker: worker.name().to_string(),
            exit_code: outcome.exit_code,
            message: message.to_string(),
        });
    }

    let line = payload_line(&outcome.stdout);
    Ok(match shape {
        ResultShape::Unit => Decoded::clean(DecodedResult::Unit),
        ResultShape::FilePathList => decode_path_list(worker, line),
        ResultShape::Integer => decode_integer(worker, line),
        ResultShape::RawText => {
            Decoded::clean(DecodedResult::RawText(line.unwrap_or_default().to_string()))
        }
    })
}

fn decode_path_list(worker: Worker, line: Option<&str>) -> Decoded {
    let reason = match line {
        None => "no payload line".to_string(),
        Some(l) => match serde_json::from_str::<Vec<String>>(l) {
            Ok(paths) => {
                return Decoded::clean(DecodedResult::FilePathList(
                    paths.into_iter().map(PathBuf::from).collect(),
                ));
            }
            Err(e) => e.to_string(),
        },
    };
    Decoded::degraded(
        DecodedResult::FilePathList(Vec::new()),
        DecodeWarning {
            worker,
            expected: "JSON string array",
            line: line.map(str::to_string),
            reason,
        },
    )
}

fn decode_integer(worker: Worker, line: Option<&str>) -> Decoded {
    let reason = match line {
        None => "no payload line".to_string(),
        Some(l) => match l.parse::<i64>() {
            Ok(n) => return Decoded::clean(DecodedResult::Integer(n)),
            Err(e) => e.to_string(),
        },
    };
    Decoded::degraded(
        DecodedResult::Integer(0),
        DecodeWarning {
            worker,
            expected: "decimal integer",
            line: line.map(str::to_string),
            reason,
        },
    )
}
