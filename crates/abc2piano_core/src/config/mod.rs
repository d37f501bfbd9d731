//! Configuration management for abc2piano.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use abc2piano_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/abc2piano.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Sample bank: {}", config.settings().paths.soundfont);
//!
//! config.settings_mut().reverb.use_limiter = false;
//! config.update_section(ConfigSection::Reverb).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DebugSettings, LoggingSettings, PathSettings, ReverbSettings, Settings,
    SynthSettings, TimeoutSettings,
};
