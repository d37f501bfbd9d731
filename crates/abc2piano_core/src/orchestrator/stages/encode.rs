//! Encode stage - optional convolution reverb, then final encoding.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::models::{StageName, ToolName};
use crate::orchestrator::stage::PipelineStage;
use crate::orchestrator::types::Context;
use crate::reverb::{filter_graph, MixOptions, OUTPUT_PAD};

/// `ffmpeg -i <dry.wav> [-i <ir.wav> -filter_complex <graph> -map [out]] -c:a <codec> [-b:a <rate>] <encoded>`
#[derive(Debug, Default)]
pub struct EncodeStage;

impl EncodeStage {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStage for EncodeStage {
    fn name(&self) -> StageName {
        StageName::Encode
    }

    fn tool(&self) -> ToolName {
        ToolName::Encoder
    }

    fn description(&self) -> &str {
        "Apply reverb and encode the final file"
    }

    fn inputs(&self, ctx: &Context<'_>) -> Vec<PathBuf> {
        let mut inputs = vec![ctx.artifacts.raw_audio.clone()];
        if let Some(impulse) = ctx.impulse {
            inputs.push(impulse.to_path_buf());
        }
        inputs
    }

    fn output(&self, ctx: &Context<'_>) -> PathBuf {
        ctx.artifacts.encoded.clone()
    }

    fn args(&self, ctx: &Context<'_>) -> Vec<OsString> {
        let format = ctx.request.format();
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            ctx.artifacts.raw_audio.clone().into_os_string(),
        ];

        let graph = filter_graph(ctx.preset, MixOptions::from(&ctx.settings.reverb));
        if let (Some(graph), Some(impulse)) = (graph, ctx.impulse) {
            args.push("-i".into());
            args.push(impulse.as_os_str().to_owned());
            args.push("-filter_complex".into());
            args.push(graph.into());
            args.push("-map".into());
            args.push(OUTPUT_PAD.into());
        }

        args.push("-c:a".into());
        args.push(format.codec().into());
        if let Some(bitrate) = format.bitrate() {
            args.push("-b:a".into());
            args.push(bitrate.into());
        }

        args.push(ctx.artifacts.encoded.clone().into_os_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;
    use crate::orchestrator::test_support::Fixture;

    fn args_of(fixture: &Fixture) -> Vec<String> {
        EncodeStage::new()
            .args(&fixture.ctx())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn dry_encode_has_no_filter() {
        let fixture = Fixture::with("none", OutputFormat::Wav);
        let args = args_of(&fixture);

        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert_eq!(args.last().unwrap(), &fixture.artifacts.encoded.display().to_string());
        assert_eq!(EncodeStage::new().inputs(&fixture.ctx()).len(), 1);
    }

    #[test]
    fn reverb_encode_convolves_with_impulse() {
        let fixture = Fixture::with("hall", OutputFormat::Mp3);
        let args = args_of(&fixture);
        let impulse = fixture.impulse.as_ref().unwrap().display().to_string();

        let ir_pos = args.iter().position(|a| *a == impulse).unwrap();
        assert_eq!(args[ir_pos - 1], "-i");

        let graph_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert!(args[graph_pos + 1].contains("afir"));
        assert_eq!(args[graph_pos + 2], "-map");
        assert_eq!(args[graph_pos + 3], "[out]");

        let codec_pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[codec_pos + 1], "libmp3lame");
        assert_eq!(args[codec_pos + 3], "192k");

        let inputs = EncodeStage::new().inputs(&fixture.ctx());
        assert_eq!(inputs.len(), 2);
    }
}
