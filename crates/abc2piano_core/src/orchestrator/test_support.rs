//! Shared fixtures for orchestrator tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use super::types::{ArtifactPaths, Context};
use crate::artifacts::ArtifactManager;
use crate::config::Settings;
use crate::logging::{LogConfig, RequestLogger};
use crate::models::{BinaryOrigin, ConversionRequest, OutputFormat, RequestId, ToolName};
use crate::reverb::{catalog, ReverbPreset};
use crate::runner::CancelHandle;
use crate::tools::{ResolvedTools, ToolBinary};

/// Owns everything a `Context` borrows.
pub struct Fixture {
    _dir: TempDir,
    pub request: ConversionRequest,
    pub request_id: RequestId,
    pub settings: Settings,
    pub tools: ResolvedTools,
    pub artifacts: ArtifactPaths,
    pub preset: &'static ReverbPreset,
    pub impulse: Option<PathBuf>,
    pub soundfont: PathBuf,
    pub logger: RequestLogger,
    pub cancel: CancelHandle,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with("none", OutputFormat::Wav)
    }

    pub fn with(preset: &str, format: OutputFormat) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tune.abc");
        fs::write(&input, "X:1\nT:Scale\nK:C\nCDEF GABc|\n").unwrap();

        let soundfont = dir.path().join("piano.sf2");
        fs::write(&soundfont, b"sfbk").unwrap();

        let preset = catalog().get(preset).unwrap();
        let impulse = preset.impulse_path(&dir.path().join("impulses"));
        if let Some(impulse) = &impulse {
            fs::create_dir_all(impulse.parent().unwrap()).unwrap();
            fs::write(impulse, b"RIFF").unwrap();
        }

        let request_id = RequestId::new();
        let manager = ArtifactManager::new(dir.path().join("work"));
        let artifacts = {
            let mut scope = manager.scope(request_id.clone());
            let paths = ArtifactPaths::acquire(&scope, format).unwrap();
            scope.keep();
            paths
        };

        let bin = dir.path().join("bin");
        let binary = |tool: ToolName| ToolBinary {
            tool,
            path: bin.join(tool.binary_name()),
            origin: BinaryOrigin::Bundled,
        };
        let tools = ResolvedTools {
            notation: binary(ToolName::NotationConverter),
            synthesizer: binary(ToolName::Synthesizer),
            encoder: binary(ToolName::Encoder),
        };

        let logger =
            RequestLogger::new(&request_id, dir.path().join("logs"), LogConfig::default(), None)
                .unwrap();

        Self {
            request: ConversionRequest::new(input, format).with_reverb(preset.name),
            request_id,
            settings: Settings::default(),
            tools,
            artifacts,
            preset,
            impulse,
            soundfont,
            logger,
            cancel: CancelHandle::new(),
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> Context<'_> {
        Context {
            request: &self.request,
            request_id: &self.request_id,
            settings: &self.settings,
            tools: &self.tools,
            artifacts: &self.artifacts,
            preset: self.preset,
            impulse: self.impulse.as_deref(),
            soundfont: &self.soundfont,
            logger: &self.logger,
            cancel: &self.cancel,
        }
    }
}
