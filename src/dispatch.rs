use crate::{
    config::Config,
    decode::{self, Decoded, DecodedResult},
    engine::{
        ExecutableResolver, Invocation, ProcessRunner, Runner, RuntimeMode, Worker, WorkerLayout,
    },
    error::Result,
    operation::{Operation, Request, ResultShape},
    page_range,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Facade over resolve -> encode -> run -> decode.
///
/// Holds no per-call state; concurrent calls share nothing but configuration.
/// Failures are returned as-is, never retried.
pub struct OperationDispatcher<R: Runner = ProcessRunner> {
    resolver: ExecutableResolver,
    runner: R,
}

impl OperationDispatcher<ProcessRunner> {
    pub fn from_config(cfg: &Config, mode: RuntimeMode) -> anyhow::Result<Self> {
        let layout = WorkerLayout::from_config(cfg)?;
        Ok(Self::new(
            ExecutableResolver::new(mode, layout),
            ProcessRunner::from_config(cfg),
        ))
    }
}

impl<R: Runner> OperationDispatcher<R> {
    pub fn new(resolver: ExecutableResolver, runner: R) -> Self {
        Self { resolver, runner }
    }

    pub fn resolver(&self) -> &ExecutableResolver {
        &self.resolver
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolve the worker and encode the request without running anything.
    pub fn prepare(&self, request: &Request) -> Result<Invocation> {
        let worker = request.operation().worker();
        self.resolver.invocation(worker, request.encode())
    }

    pub async fn run(&self, request: &Request) -> Result<Decoded> {
        let invocation = self.prepare(request)?;
        self.execute(request.operation(), &invocation).await
    }

    /// Run an already prepared invocation and decode it as `operation` expects.
    pub async fn execute(&self, operation: Operation, invocation: &Invocation) -> Result<Decoded> {
        self.run_shaped(operation.to_string(), operation.result_shape(), invocation)
            .await
    }

    /// Run any worker with caller-supplied arguments; the payload line comes back verbatim.
    pub async fn run_raw(&self, worker: Worker, args: Vec<OsString>) -> Result<Decoded> {
        let invocation = self.resolver.invocation(worker, args)?;
        self.run_shaped(format!("raw:{worker}"), ResultShape::RawText, &invocation)
            .await
    }

    pub async fn page_count(&self, input: &Path) -> Result<u32> {
        let decoded = self
            .run(&Request::PageCount {
                input: input.to_path_buf(),
            })
            .await?;
        Ok(match decoded.result {
            DecodedResult::Integer(n) => u32::try_from(n).unwrap_or_else(|_| {
                warn!("page count out of range: {n}");
                0
            }),
            _ => 0,
        })
    }

    /// Count pages and parse `range_text` against that count.
    ///
    /// Fails with [`crate::error::SidecarError::InvalidRange`] when no page
    /// survives parsing, so the extraction worker is never started.
    pub async fn plan_extraction(
        &self,
        input: &Path,
        range_text: &str,
        output: &Path,
    ) -> Result<Request> {
        let page_count = self.page_count(input).await?;
        let pages = page_range::parse_selection(range_text, page_count)?;
        info!(
            "extracting {} of {} pages from {}",
            pages.len(),
            page_count,
            input.display()
        );
        Ok(Request::ExtractPages {
            input: input.to_path_buf(),
            pages,
            output: PathBuf::from(output),
        })
    }

    pub async fn extract_page_range(
        &self,
        input: &Path,
        range_text: &str,
        output: &Path,
    ) -> Result<Decoded> {
        let request = self.plan_extraction(input, range_text, output).await?;
        self.run(&request).await
    }

    async fn run_shaped(
        &self,
        label: String,
        shape: ResultShape,
        invocation: &Invocation,
    ) -> Result<Decoded> {
        let started = Instant::now();
        info!("{} via {}", label, invocation.worker);
        let outcome = self.runner.run(invocation).await?;
        let decoded = decode::decode(invocation.worker, shape, &outcome);
        match &decoded {
            Ok(_) => info!("{} ok in {:?}", label, started.elapsed()),
            Err(e) => warn!("{} failed in {:?}: {}", label, started.elapsed(), e),
        }
        decoded
    }
}
