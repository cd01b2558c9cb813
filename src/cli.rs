use crate::{
    config::Config,
    dispatch::OperationDispatcher,
    engine::{RuntimeMode, Worker, WorkerLayout},
    operation::Request,
    page_range::PageSelection,
    report::{DoctorReport, RunReport},
    util::{ensure_dir, looks_like_url, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const MODE_ENV: &str = "DOCFORGE_RUNTIME_MODE";

#[derive(Parser, Debug)]
#[command(name = "docforge")]
#[command(about = "Document and media conversions via sidecar workers")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./docforge.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that every worker resolves in the active runtime mode.
    Doctor {},
    /// Run a worker with raw arguments and print its payload line.
    Exec {
        #[arg(long)]
        worker: Worker,
        #[arg(last = true)]
        args: Vec<String>,
    },
    Merge {
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    Rotate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        degrees: i32,
    },
    Split {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Extract pages given as 1-based range text, e.g. "1-5, 8, 11-13".
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        pages: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Extract pages given as zero-based indices, e.g. 0,4,7.
    ExtractIndices {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, required = true, value_delimiter = ',')]
        indices: Vec<u32>,
        #[arg(long)]
        output: PathBuf,
    },
    Compress {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    PageCount {
        #[arg(long)]
        input: PathBuf,
    },
    Decrypt {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    Ocr {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    ArchiveExtract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
    },
    ArchiveCreate {
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    ArchiveConvert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    ImageConvert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    ImageCompress {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Target size in bytes.
        #[arg(long)]
        target_size: u64,
    },
    ImagesToPdf {
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    DocToPdf {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

impl Command {
    fn into_request(self) -> Result<Request> {
        Ok(match self {
            Command::Merge { inputs, output } => Request::Merge { inputs, output },
            Command::Rotate { input, degrees } => Request::Rotate { input, degrees },
            Command::Split { input, output_dir } => Request::Split { input, output_dir },
            Command::ExtractIndices {
                input,
                indices,
                output,
            } => Request::ExtractPages {
                input,
                pages: PageSelection::from_indices(indices)
                    .ok_or_else(|| anyhow!("no page indices given"))?,
                output,
            },
            Command::Compress { input, output } => Request::Compress { input, output },
            Command::PageCount { input } => Request::PageCount { input },
            Command::Decrypt { input, output } => Request::Decrypt { input, output },
            Command::Ocr { input, output } => Request::Ocr { input, output },
            Command::ArchiveExtract { input, output_dir } => {
                Request::ArchiveExtract { input, output_dir }
            }
            Command::ArchiveCreate { inputs, output } => Request::ArchiveCreate { inputs, output },
            Command::ArchiveConvert { input, output } => Request::ArchiveConvert { input, output },
            Command::ImageConvert { input, output } => Request::ImageConvert { input, output },
            Command::ImageCompress {
                input,
                output,
                target_size,
            } => Request::ImageCompress {
                input,
                output,
                target_size,
            },
            Command::ImagesToPdf { inputs, output } => Request::ImagesToPdf { inputs, output },
            Command::DocToPdf { input, output } => Request::DocToPdf { input, output },
            Command::Doctor {} | Command::Exec { .. } | Command::Extract { .. } => {
                return Err(anyhow!("not a worker operation"));
            }
        })
    }
}

pub async fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    if cfg.debug.dump_effective_config {
        debug!("effective config:\n{}", toml::to_string(&cfg).unwrap_or_default());
    }

    let mode = resolve_mode(&cfg)?;
    info!("runtime mode {:?}", mode);
    let dispatcher = OperationDispatcher::from_config(&cfg, mode)?;

    match args.cmd {
        Command::Doctor {} => doctor(&dispatcher),
        Command::Exec { worker, args } => exec(&dispatcher, worker, args).await,
        Command::Extract {
            input,
            pages,
            output,
        } => {
            validate_input(&cfg, &input)?;
            let request = dispatcher.plan_extraction(&input, &pages, &output).await?;
            run_request(&dispatcher, request).await
        }
        cmd => {
            let request = cmd.into_request()?;
            for input in request.inputs() {
                validate_input(&cfg, input)?;
            }
            run_request(&dispatcher, request).await
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["docforge.toml", "docforge.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Runtime mode is decided once here and handed down by value.
fn resolve_mode(cfg: &Config) -> Result<RuntimeMode> {
    let layout = WorkerLayout::from_config(cfg)?;
    let raw = std::env::var(MODE_ENV).unwrap_or_else(|_| cfg.runtime.mode.clone());
    RuntimeMode::from_setting(&raw, &layout)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("docforge.log"))
}

fn doctor(dispatcher: &OperationDispatcher) -> Result<()> {
    let report = DoctorReport::collect(dispatcher.resolver());
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.ok {
        return Err(anyhow!("one or more workers are missing"));
    }
    Ok(())
}

async fn exec(dispatcher: &OperationDispatcher, worker: Worker, args: Vec<String>) -> Result<()> {
    let args: Vec<OsString> = args.into_iter().map(OsString::from).collect();
    let decoded = dispatcher
        .run_raw(worker, args)
        .await
        .with_context(|| format!("exec {worker}"))?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

async fn run_request(dispatcher: &OperationDispatcher, request: Request) -> Result<()> {
    let operation = request.operation();
    let invocation = dispatcher.prepare(&request)?;

    let started = now_rfc3339();
    let clock = Instant::now();
    let decoded = dispatcher
        .execute(operation, &invocation)
        .await
        .with_context(|| format!("{operation} failed"))?;

    let report = RunReport::new(
        operation,
        dispatcher.resolver().mode(),
        &invocation,
        started,
        now_rfc3339(),
        clock.elapsed(),
        decoded,
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    Ok(())
}
