//! Data models shared across the pipeline.

mod enums;
mod request;

pub use enums::{BinaryOrigin, OutputFormat, StageName, ToolName, UnknownFormat};
pub use request::{ConversionRequest, RequestId};
