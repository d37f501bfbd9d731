//! Subprocess execution for pipeline stages.

mod cancel;
mod stage_runner;

pub use cancel::CancelHandle;
pub use stage_runner::{StageInvocation, StageResult, StageRunner};
