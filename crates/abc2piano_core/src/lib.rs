//! abc2piano core - renders notation files to piano audio.
//!
//! This crate contains the conversion pipeline with zero front-end
//! dependencies. The notation parser, the synthesizer and the encoder are
//! external programs; this crate finds them, runs them in order and
//! cleans up after them.

pub mod artifacts;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod reverb;
pub mod runner;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
