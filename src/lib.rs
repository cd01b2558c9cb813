pub mod cli;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod operation;
pub mod page_range;
pub mod report;
pub mod util;

pub use decode::{Decoded, DecodedResult, DecodeWarning};
pub use dispatch::OperationDispatcher;
pub use error::SidecarError;
pub use operation::{Operation, Request};
