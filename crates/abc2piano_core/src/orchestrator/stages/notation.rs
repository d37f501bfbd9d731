//! Notation stage - converts the notation file to MIDI.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::models::{StageName, ToolName};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::Context;

/// `abc2midi <input> -o <score.mid>`
#[derive(Debug, Default)]
pub struct NotationStage;

impl NotationStage {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStage for NotationStage {
    fn name(&self) -> StageName {
        StageName::Notation
    }

    fn tool(&self) -> ToolName {
        ToolName::NotationConverter
    }

    fn description(&self) -> &str {
        "Convert notation to MIDI"
    }

    fn inputs(&self, ctx: &Context<'_>) -> Vec<PathBuf> {
        vec![ctx.request.input().to_path_buf()]
    }

    fn output(&self, ctx: &Context<'_>) -> PathBuf {
        ctx.artifacts.midi.clone()
    }

    fn args(&self, ctx: &Context<'_>) -> Vec<OsString> {
        vec![
            ctx.request.input().as_os_str().to_owned(),
            "-o".into(),
            ctx.artifacts.midi.clone().into_os_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::Fixture;

    #[test]
    fn args_follow_template() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();

        let args = NotationStage::new().args(&ctx);
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], fixture.request.input().as_os_str());
        assert_eq!(args[1], "-o");
        assert_eq!(args[2], fixture.artifacts.midi.as_os_str());
    }

    #[test]
    fn reads_request_input_writes_midi() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let stage = NotationStage::new();

        assert_eq!(stage.inputs(&ctx), vec![fixture.request.input().to_path_buf()]);
        assert_eq!(stage.output(&ctx), fixture.artifacts.midi);
    }
}
