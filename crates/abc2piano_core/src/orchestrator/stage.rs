//! Pipeline stage trait definition.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use super::types::Context;
use crate::models::{StageName, ToolName};

/// One fixed step of the conversion pipeline.
///
/// A stage only describes its invocation: which tool, which argv, which
/// files it reads and writes. Running it is the pipeline's job.
pub trait PipelineStage: Send + Sync {
    /// Stage name (for logging and error context).
    fn name(&self) -> StageName;

    /// Tool this stage invokes.
    fn tool(&self) -> ToolName;

    /// Human-readable description of what this stage does.
    fn description(&self) -> &str;

    /// Files that must exist before the tool runs.
    fn inputs(&self, ctx: &Context<'_>) -> Vec<PathBuf>;

    /// File the tool must produce.
    fn output(&self, ctx: &Context<'_>) -> PathBuf;

    /// Argument template with the request's paths filled in.
    fn args(&self, ctx: &Context<'_>) -> Vec<OsString>;

    /// Time the tool is allowed to run.
    fn timeout(&self, ctx: &Context<'_>) -> Duration {
        ctx.settings.timeouts.for_stage(self.name())
    }
}
