//! Core types for the conversion pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifacts::{ArtifactError, ArtifactScope, ArtifactSlot};
use crate::config::Settings;
use crate::logging::RequestLogger;
use crate::models::{ConversionRequest, OutputFormat, RequestId, StageName};
use crate::reverb::ReverbPreset;
use crate::runner::{CancelHandle, StageResult};
use crate::tools::ResolvedTools;

/// Intermediate file paths for one request.
///
/// Each stage's output is the next stage's input.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub midi: PathBuf,
    pub raw_audio: PathBuf,
    pub encoded: PathBuf,
    stage_logs: HashMap<StageName, PathBuf>,
}

impl ArtifactPaths {
    /// Acquire every slot the pipeline needs from `scope`.
    pub fn acquire(scope: &ArtifactScope<'_>, format: OutputFormat) -> Result<Self, ArtifactError> {
        let mut stage_logs = HashMap::new();
        for stage in [StageName::Notation, StageName::Synthesis, StageName::Encode] {
            stage_logs.insert(stage, scope.acquire(ArtifactSlot::StageLog(stage))?);
        }

        Ok(Self {
            midi: scope.acquire(ArtifactSlot::Midi)?,
            raw_audio: scope.acquire(ArtifactSlot::RawAudio)?,
            encoded: scope.acquire(ArtifactSlot::Encoded(format))?,
            stage_logs,
        })
    }

    /// Capture file for a stage's tool output.
    pub fn stage_log(&self, stage: StageName) -> PathBuf {
        self.stage_logs
            .get(&stage)
            .cloned()
            .unwrap_or_else(|| self.midi.with_file_name(format!("{}.log", stage)))
    }
}

/// Read-only context passed to pipeline stages.
///
/// Everything a stage needs to build its invocation. Mutable results go
/// in `ConversionState`.
pub struct Context<'a> {
    pub request: &'a ConversionRequest,
    pub request_id: &'a RequestId,
    pub settings: &'a Settings,
    pub tools: &'a ResolvedTools,
    pub artifacts: &'a ArtifactPaths,
    pub preset: &'a ReverbPreset,
    /// Impulse response for `preset` (`None` for the sentinel).
    pub impulse: Option<&'a Path>,
    pub soundfont: &'a Path,
    pub logger: &'a RequestLogger,
    pub cancel: &'a CancelHandle,
}

/// Results accumulated while the pipeline runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionState {
    pub request_id: String,
    pub started_at: Option<String>,
    pub stages: Vec<StageResult>,
}

impl ConversionState {
    pub fn new(request_id: &RequestId) -> Self {
        Self {
            request_id: request_id.to_string(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            stages: Vec::new(),
        }
    }

    /// Check if a stage has completed.
    pub fn has_stage(&self, stage: StageName) -> bool {
        self.stages.iter().any(|r| r.stage == stage)
    }

    pub fn result(&self, stage: StageName) -> Option<&StageResult> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactManager;
    use crate::models::ToolName;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn artifact_paths_share_request_dir() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path());
        let scope = manager.scope(RequestId::new());

        let paths = ArtifactPaths::acquire(&scope, OutputFormat::Mp3).unwrap();
        let request_dir = manager.request_dir(scope.request());

        assert!(paths.midi.starts_with(&request_dir));
        assert!(paths.encoded.ends_with("encoded.mp3"));
        assert_eq!(paths.stage_log(StageName::Synthesis), request_dir.join("synthesis.log"));
    }

    #[test]
    fn state_tracks_completion() {
        let mut state = ConversionState::new(&RequestId::new());
        assert!(!state.has_stage(StageName::Notation));

        state.stages.push(StageResult {
            stage: StageName::Notation,
            tool: ToolName::NotationConverter,
            exit_code: 0,
            diagnostics: String::new(),
            elapsed: Duration::from_millis(5),
            output: PathBuf::from("score.mid"),
            output_bytes: 14,
        });

        assert!(state.has_stage(StageName::Notation));
        assert_eq!(state.result(StageName::Notation).map(|r| r.output_bytes), Some(14));
    }

    #[test]
    fn state_serializes() {
        let id = RequestId::new();
        let state = ConversionState::new(&id);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(&format!("\"request_id\":\"{}\"", id)));
    }
}
