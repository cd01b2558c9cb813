pub mod process;
pub mod resolver;
pub mod types;

use crate::error::Result;
use std::future::Future;

pub use process::ProcessRunner;
pub use resolver::{ExecutableResolver, Platform, RuntimeMode, WorkerLayout};
pub use types::{Invocation, ProcessOutcome, Worker};

/// Executes one invocation to completion.
pub trait Runner {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ProcessOutcome>> + Send;
}
