//! Convolution reverb presets.
//!
//! The catalog is a fixed table built once per process and shared
//! read-only by every conversion.

mod catalog;
mod filter;

pub use catalog::{catalog, ReverbCatalog, ReverbError, ReverbPreset, NONE_PRESET};
pub use filter::{filter_graph, MixOptions, OUTPUT_PAD};
