//! Error types for the conversion pipeline.
//!
//! Errors carry context that chains through layers:
//! Request → Stage → Tool → Diagnostics

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::models::{StageName, ToolName, UnknownFormat};
use crate::reverb::ReverbError;
use crate::tools::ResolveError;

/// Process exit codes surfaced by front ends.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const INTERNAL: i32 = 1;
    pub const TOOL_NOT_FOUND: i32 = 2;
    pub const STAGE_FAILED: i32 = 3;
    pub const INVALID_REQUEST: i32 = 4;
}

/// Top-level error returned by `Orchestrator::convert`.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A required tool could not be resolved; nothing was run.
    #[error("required tool '{tool}' not found (looked in the bundled directory and on PATH)")]
    ToolNotFound { tool: ToolName },

    /// The request was rejected before any subprocess ran.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// A stage failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: StageName,
        #[source]
        source: StageError,
    },

    /// Something outside the stages went wrong.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ConversionError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn stage_failed(stage: StageName, source: StageError) -> Self {
        Self::Stage { stage, source }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stage the failure is attributed to, if any.
    pub fn stage(&self) -> Option<StageName> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Underlying stage cause, if any.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            Self::Stage { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.stage_error(), Some(StageError::Timeout { .. }))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.stage_error(), Some(StageError::Cancelled))
    }

    /// Exit code a front end should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolNotFound { .. } => exit_code::TOOL_NOT_FOUND,
            Self::InvalidRequest { .. } => exit_code::INVALID_REQUEST,
            Self::Stage { .. } => exit_code::STAGE_FAILED,
            Self::Internal { .. } => exit_code::INTERNAL,
        }
    }
}

impl From<ResolveError> for ConversionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ToolNotFound { tool } => Self::ToolNotFound { tool },
        }
    }
}

impl From<ReverbError> for ConversionError {
    fn from(err: ReverbError) -> Self {
        Self::invalid_request(err.to_string())
    }
}

impl From<UnknownFormat> for ConversionError {
    fn from(err: UnknownFormat) -> Self {
        Self::invalid_request(err.to_string())
    }
}

impl From<ArtifactError> for ConversionError {
    fn from(err: ArtifactError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Cause of a single stage failure.
#[derive(Error, Debug)]
pub enum StageError {
    /// The tool exited unsuccessfully.
    #[error("{tool} {}: {diagnostics}", describe_exit(.exit_code))]
    Failed {
        tool: ToolName,
        exit_code: Option<i32>,
        diagnostics: String,
    },

    /// The tool exited 0 but left no usable output.
    #[error("no output produced by {tool} (expected {path})")]
    NoOutput { tool: ToolName, path: PathBuf },

    /// The tool ran past its allotted time and was killed.
    #[error("{tool} timed out after {}s: {diagnostics}", seconds(.after))]
    Timeout {
        tool: ToolName,
        after: Duration,
        diagnostics: String,
    },

    /// The caller cancelled the request.
    #[error("cancelled")]
    Cancelled,

    /// A stage input is missing or unreadable; the tool was not launched.
    #[error("input {path} is unreadable: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// File I/O or process management error.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn input_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InputUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Tool output excerpt attached to the failure, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Failed { diagnostics, .. } | Self::Timeout { diagnostics, .. } => {
                Some(diagnostics.as_str())
            }
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failed with exit code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn seconds(after: &Duration) -> f64 {
    after.as_secs_f64()
}

/// Result type for stage operations.
pub type StepResult<T> = Result<T, StageError>;

/// Result type for conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;
