//! Conversion request and its identifier.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::OutputFormat;

/// Unique identifier for one in-flight conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to render one notation file to audio.
///
/// Immutable once built; consumed by `Orchestrator::convert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    input: PathBuf,
    format: OutputFormat,
    reverb: Option<String>,
    output: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            format,
            reverb: None,
            output: None,
        }
    }

    /// Select a reverb preset by name (`"none"` disables reverb).
    pub fn with_reverb(mut self, preset: impl Into<String>) -> Self {
        self.reverb = Some(preset.into());
        self
    }

    /// Write the result to an explicit path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Requested preset name, if any.
    pub fn reverb(&self) -> Option<&str> {
        self.reverb.as_deref()
    }

    /// Requested output path, if any.
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Final output location: the explicit path, or the input's stem with
    /// the format's extension inside `output_dir` (next to the input when
    /// `None`).
    pub fn resolve_output(&self, output_dir: Option<&Path>) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }

        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let filename = format!("{}.{}", stem, self.format.extension());

        match output_dir {
            Some(dir) => dir.join(filename),
            None => self
                .input
                .parent()
                .map(|p| p.join(&filename))
                .unwrap_or_else(|| PathBuf::from(&filename)),
        }
    }
}
