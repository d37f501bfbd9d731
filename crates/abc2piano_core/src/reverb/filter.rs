//! Encoder filter graph for convolution reverb.
//!
//! ```text
//! [0:a] ──asplit──┬── afir(IR = [1:a]) ── wet ─┐
//!                 └──────────────────────── dry ┴─ amix ─ volume ─ [alimiter] ─ [out]
//! ```

use super::catalog::{ReverbPreset, GAIN_RANGE};
use crate::config::ReverbSettings;

/// Mix options applied to every preset.
///
/// The optional fields override the preset's own values when set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixOptions {
    pub post_volume: f64,
    pub use_limiter: bool,
    /// `afir` dry gain.
    pub dry_gain: Option<f64>,
    /// `afir` wet gain.
    pub wet_gain: Option<f64>,
    /// `amix` weight of the dry branch.
    pub mix_dry: Option<f64>,
    /// `amix` weight of the wet branch.
    pub mix_wet: Option<f64>,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            post_volume: 3.0,
            use_limiter: true,
            dry_gain: None,
            wet_gain: None,
            mix_dry: None,
            mix_wet: None,
        }
    }
}

impl From<&ReverbSettings> for MixOptions {
    fn from(settings: &ReverbSettings) -> Self {
        Self {
            post_volume: settings.post_volume,
            use_limiter: settings.use_limiter,
            dry_gain: settings.dry_gain,
            wet_gain: settings.wet_gain,
            mix_dry: settings.mix_dry,
            mix_wet: settings.mix_wet,
        }
    }
}

/// Label of the graph's final output pad.
pub const OUTPUT_PAD: &str = "[out]";

fn gain(value: f64) -> f64 {
    value.clamp(GAIN_RANGE.0, GAIN_RANGE.1)
}

/// Build the `-filter_complex` value for `preset`.
///
/// Input 0 is the dry recording, input 1 the impulse response.
/// Returns `None` for the sentinel preset.
pub fn filter_graph(preset: &ReverbPreset, options: MixOptions) -> Option<String> {
    if preset.is_none() {
        return None;
    }

    let dry_gain = gain(options.dry_gain.unwrap_or(preset.dry_gain));
    let wet_gain = gain(options.wet_gain.unwrap_or(preset.wet_gain));
    let mix = preset.mix.clamp(0.0, 1.0);
    let mix_dry = gain(options.mix_dry.unwrap_or(1.0 - mix));
    let mix_wet = gain(options.mix_wet.unwrap_or(mix));

    let mut graph = format!(
        "[0:a]asplit=2[conv][dry];\
         [conv][1:a]afir=dry={dry_gain:.2}:wet={wet_gain:.2}[wet];\
         [dry][wet]amix=inputs=2:weights='{mix_dry:.2} {mix_wet:.2}',volume={:.2}",
        options.post_volume,
    );
    if options.use_limiter {
        graph.push_str(",alimiter");
    }
    graph.push_str(OUTPUT_PAD);

    Some(graph)
}
