//! The three fixed pipeline stages.
//!
//! notation file ─▶ [notation] ─▶ MIDI ─▶ [synthesis] ─▶ dry WAV ─▶ [encode] ─▶ final audio

mod encode;
mod notation;
mod synthesis;

pub use encode::EncodeStage;
pub use notation::NotationStage;
pub use synthesis::SynthesisStage;
