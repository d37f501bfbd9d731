//! Pipeline runner that executes stages in sequence.

use super::errors::{ConversionError, ConversionResult, StageError};
use super::stage::PipelineStage;
use super::stages::{EncodeStage, NotationStage, SynthesisStage};
use super::types::{Context, ConversionState};
use crate::runner::{StageInvocation, StageRunner};

/// Pipeline that runs a fixed sequence of stages.
///
/// A stage runs only after the previous one produced its output; the
/// first failure stops the pipeline and is attributed to that stage.
pub struct Pipeline {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage (builder pattern).
    pub fn with_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// notation → synthesis → encode.
    pub fn standard() -> Self {
        Self::new()
            .with_stage(NotationStage::new())
            .with_stage(SynthesisStage::new())
            .with_stage(EncodeStage::new())
    }

    /// Run every stage in order.
    ///
    /// For each stage:
    /// 1. Check for cancellation
    /// 2. Build the invocation from the context
    /// 3. Run the tool through `runner`
    /// 4. Record the result in `state`
    pub fn run(
        &self,
        ctx: &Context<'_>,
        runner: &StageRunner,
        state: &mut ConversionState,
    ) -> ConversionResult<()> {
        for stage in &self.stages {
            let name = stage.name();

            if ctx.cancel.is_cancelled() {
                ctx.logger
                    .warn(&format!("Conversion cancelled before stage '{}'", name));
                return Err(ConversionError::stage_failed(name, StageError::Cancelled));
            }

            ctx.logger.phase(stage.description());

            let invocation = StageInvocation {
                stage: name,
                binary: ctx.tools.get(stage.tool()),
                args: stage.args(ctx),
                inputs: stage.inputs(ctx),
                output: stage.output(ctx),
                log_path: ctx.artifacts.stage_log(name),
                timeout: stage.timeout(ctx),
            };
            ctx.logger.command(&invocation.command_line());

            match runner.run(&invocation, ctx.cancel) {
                Ok(result) => {
                    for line in result.diagnostics.lines() {
                        ctx.logger.tool_output(line);
                    }
                    ctx.logger.clear_tail();
                    ctx.logger.success(&format!(
                        "{} finished in {:.2}s",
                        name,
                        result.elapsed.as_secs_f64()
                    ));
                    state.stages.push(result);
                }
                Err(e) => {
                    if let Some(diagnostics) = e.diagnostics() {
                        for line in diagnostics.lines() {
                            ctx.logger.tool_output(line);
                        }
                        ctx.logger.dump_tail(name.as_str());
                    }
                    ctx.logger.error(&format!("{} failed: {}", name, e));
                    return Err(ConversionError::stage_failed(name, e));
                }
            }
        }

        ctx.logger.success("Pipeline completed successfully");
        Ok(())
    }

    /// Get the number of stages in the pipeline.
    pub fn step_count(&self) -> usize {
        self.stages.len()
    }

    /// Get stage names in order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name().as_str()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputFormat, StageName};
    use crate::orchestrator::test_support::Fixture;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = Pipeline::standard();
        assert_eq!(pipeline.step_count(), 3);
        assert_eq!(pipeline.step_names(), vec!["notation", "synthesis", "encode"]);
    }

    #[test]
    fn each_output_feeds_the_next_stage() {
        let fixture = Fixture::with("hall", OutputFormat::Opus);
        let ctx = fixture.ctx();
        let pipeline = Pipeline::standard();

        for pair in pipeline.stages.windows(2) {
            let produced = pair[0].output(&ctx);
            let consumed = pair[1].inputs(&ctx);
            assert_eq!(consumed.first(), Some(&produced));
        }
    }

    #[test]
    fn cancelled_before_first_stage() {
        let fixture = Fixture::new();
        fixture.cancel.cancel();

        let mut state = ConversionState::new(&fixture.request_id);
        let err = Pipeline::standard()
            .run(&fixture.ctx(), &StageRunner::new(), &mut state)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.stage(), Some(StageName::Notation));
        assert!(state.stages.is_empty());
    }

    #[test]
    fn missing_tool_binary_fails_first_stage() {
        let fixture = Fixture::new();
        let mut state = ConversionState::new(&fixture.request_id);

        let err = Pipeline::standard()
            .run(&fixture.ctx(), &StageRunner::new(), &mut state)
            .unwrap_err();

        assert_eq!(err.stage(), Some(StageName::Notation));
        assert!(matches!(err.stage_error(), Some(StageError::Io { .. })));
    }
}
