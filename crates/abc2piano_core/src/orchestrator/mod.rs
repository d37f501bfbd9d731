//! Conversion orchestration.
//!
//! Sequences tool resolution, the three pipeline stages and artifact
//! cleanup for one request.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::convert
//!     ├── resolve abc2midi, fluidsynth, ffmpeg
//!     └── Pipeline
//!           ├── Stage: notation   (notation → score.mid)
//!           ├── Stage: synthesis  (score.mid + sample bank → dry.wav)
//!           └── Stage: encode     (dry.wav [+ impulse] → encoded.<ext>)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use abc2piano_core::config::Settings;
//! use abc2piano_core::models::{ConversionRequest, OutputFormat};
//! use abc2piano_core::orchestrator::Orchestrator;
//!
//! let orchestrator = Orchestrator::new(Settings::default());
//! let request = ConversionRequest::new("tune.abc", OutputFormat::Mp3).with_reverb("hall");
//!
//! match orchestrator.convert(&request) {
//!     Ok(path) => println!("wrote {}", path.display()),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod converter;
mod errors;
mod pipeline;
mod stage;
pub mod stages;
mod types;

#[cfg(test)]
mod test_support;

pub use converter::Orchestrator;
pub use errors::{exit_code, ConversionError, ConversionResult, StageError, StepResult};
pub use pipeline::Pipeline;
pub use stage::PipelineStage;
pub use stages::{EncodeStage, NotationStage, SynthesisStage};
pub use types::{ArtifactPaths, Context, ConversionState};
