//! Synthesis stage - renders MIDI against the sample bank.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::models::{StageName, ToolName};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::Context;

/// `fluidsynth -F <dry.wav> -r <rate> -g <gain> -i -n -T wav <bank> <score.mid>`
#[derive(Debug, Default)]
pub struct SynthesisStage;

impl SynthesisStage {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStage for SynthesisStage {
    fn name(&self) -> StageName {
        StageName::Synthesis
    }

    fn tool(&self) -> ToolName {
        ToolName::Synthesizer
    }

    fn description(&self) -> &str {
        "Render MIDI to uncompressed audio"
    }

    fn inputs(&self, ctx: &Context<'_>) -> Vec<PathBuf> {
        vec![ctx.artifacts.midi.clone(), ctx.soundfont.to_path_buf()]
    }

    fn output(&self, ctx: &Context<'_>) -> PathBuf {
        ctx.artifacts.raw_audio.clone()
    }

    fn args(&self, ctx: &Context<'_>) -> Vec<OsString> {
        let synth = &ctx.settings.synth;
        vec![
            "-F".into(),
            ctx.artifacts.raw_audio.clone().into_os_string(),
            "-r".into(),
            synth.sample_rate.to_string().into(),
            "-g".into(),
            synth.gain.to_string().into(),
            // No interactive shell, no MIDI input device.
            "-i".into(),
            "-n".into(),
            "-T".into(),
            "wav".into(),
            ctx.soundfont.as_os_str().to_owned(),
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

        let args: Vec<String> = SynthesisStage::new()
            .args(&ctx)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "-F");
        assert_eq!(args[1], fixture.artifacts.raw_audio.display().to_string());
        assert_eq!(&args[2..10], ["-r", "44100", "-g", "0.8", "-i", "-n", "-T", "wav"]);
        assert_eq!(args[10], fixture.soundfont.display().to_string());
        assert_eq!(args[11], fixture.artifacts.midi.display().to_string());
    }

    #[test]
    fn sample_bank_is_an_input() {
        let fixture = Fixture::new();
        let inputs = SynthesisStage::new().inputs(&fixture.ctx());
        assert!(inputs.contains(&fixture.soundfont));
        assert_eq!(inputs[0], fixture.artifacts.midi);
    }
}
