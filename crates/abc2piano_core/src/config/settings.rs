//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::StageName;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Asset, tool, and working directories.
    #[serde(default)]
    pub paths: PathSettings,

    /// Synthesizer rendering options.
    #[serde(default)]
    pub synth: SynthSettings,

    /// Reverb mixing options shared by every preset.
    #[serde(default)]
    pub reverb: ReverbSettings,

    /// Per-stage subprocess timeouts.
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Debugging aids.
    #[serde(default)]
    pub debug: DebugSettings,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root for request-scoped temporary directories. Empty means the
    /// system temp directory.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for per-request log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Folder for final outputs when the request names none. Empty means
    /// next to the input file.
    #[serde(default)]
    pub output_folder: String,

    /// Root of the bundled tool tree (`<root>/<platform>/<tool>`).
    #[serde(default = "default_bundled_tools")]
    pub bundled_tools: String,

    /// Instrument sample bank handed to the synthesizer.
    #[serde(default = "default_soundfont")]
    pub soundfont: String,

    /// Directory holding the reverb impulse responses.
    #[serde(default = "default_impulses_dir")]
    pub impulses_dir: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_bundled_tools() -> String {
    "resources/bin".to_string()
}

fn default_soundfont() -> String {
    "resources/YDP-GrandPiano-20160804.sf2".to_string()
}

fn default_impulses_dir() -> String {
    "resources/impulses".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: String::new(),
            logs_folder: default_logs_folder(),
            output_folder: String::new(),
            bundled_tools: default_bundled_tools(),
            soundfont: default_soundfont(),
            impulses_dir: default_impulses_dir(),
        }
    }
}

impl PathSettings {
    /// Resolved temp root (falls back to the system temp directory).
    pub fn temp_root_dir(&self) -> PathBuf {
        if self.temp_root.is_empty() {
            std::env::temp_dir().join("abc2piano")
        } else {
            PathBuf::from(&self.temp_root)
        }
    }

    /// Output folder, if one is configured.
    pub fn output_dir(&self) -> Option<PathBuf> {
        if self.output_folder.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.output_folder))
        }
    }

    /// Root of the bundled tool tree.
    pub fn bundled_tools_dir(&self) -> PathBuf {
        resolve_resource(&self.bundled_tools, install_dir().as_deref())
    }

    /// Sample bank handed to the synthesizer.
    pub fn soundfont_path(&self) -> PathBuf {
        resolve_resource(&self.soundfont, install_dir().as_deref())
    }

    /// Directory holding the impulse responses.
    pub fn impulses_path(&self) -> PathBuf {
        resolve_resource(&self.impulses_dir, install_dir().as_deref())
    }
}

/// Directory of the running executable. Bundled resources ship next to it.
fn install_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Absolute paths are used as given; relative ones hang off `base`.
fn resolve_resource(value: &str, base: Option<&Path>) -> PathBuf {
    let path = Path::new(value);
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Synthesizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthSettings {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Master gain (the synthesizer's own default of 0.2 is very quiet).
    #[serde(default = "default_gain")]
    pub gain: f64,
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_gain() -> f64 {
    0.8
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            gain: default_gain(),
        }
    }
}

/// Reverb mixing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverbSettings {
    /// Preset used when a request names none.
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Gain applied after the dry/wet mix.
    #[serde(default = "default_post_volume")]
    pub post_volume: f64,

    /// Insert a soft limiter at the end of the reverb chain.
    #[serde(default = "default_true")]
    pub use_limiter: bool,

    /// Override of the preset's convolution dry gain (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_gain: Option<f64>,

    /// Override of the preset's convolution wet gain (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wet_gain: Option<f64>,

    /// Override of the dry branch weight in the final mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_dry: Option<f64>,

    /// Override of the wet branch weight in the final mix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_wet: Option<f64>,
}

fn default_preset() -> String {
    "hall".to_string()
}

fn default_post_volume() -> f64 {
    3.0
}

fn default_true() -> bool {
    true
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            post_volume: default_post_volume(),
            use_limiter: true,
            dry_gain: None,
            wet_gain: None,
            mix_dry: None,
            mix_wet: None,
        }
    }
}

/// Per-stage timeouts in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_notation_secs")]
    pub notation_secs: u64,

    #[serde(default = "default_render_secs")]
    pub synthesis_secs: u64,

    #[serde(default = "default_render_secs")]
    pub encode_secs: u64,
}

fn default_notation_secs() -> u64 {
    60
}

fn default_render_secs() -> u64 {
    600
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            notation_secs: default_notation_secs(),
            synthesis_secs: default_render_secs(),
            encode_secs: default_render_secs(),
        }
    }
}

impl TimeoutSettings {
    /// Timeout for a given stage.
    pub fn for_stage(&self, stage: StageName) -> Duration {
        let secs = match stage {
            StageName::Notation => self.notation_secs,
            StageName::Synthesis => self.synthesis_secs,
            StageName::Encode => self.encode_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep tool output out of the request log unless a stage fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix request log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Debugging aids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Leave the request's temporary directory on disk when a conversion
    /// fails.
    #[serde(default)]
    pub keep_intermediates_on_failure: bool,
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Synth,
    Reverb,
    Timeouts,
    Logging,
    Debug,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Synth,
        ConfigSection::Reverb,
        ConfigSection::Timeouts,
        ConfigSection::Logging,
        ConfigSection::Debug,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Synth => "synth",
            ConfigSection::Reverb => "reverb",
            ConfigSection::Timeouts => "timeouts",
            ConfigSection::Logging => "logging",
            ConfigSection::Debug => "debug",
        }
    }

    /// Comment line written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Assets, bundled tools and working directories",
            ConfigSection::Synth => "# MIDI rendering",
            ConfigSection::Reverb => "# Convolution reverb mixing",
            ConfigSection::Timeouts => "# Per-stage timeouts (seconds)",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Debug => "# Debugging aids",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[timeouts]"));
        assert!(toml.contains("soundfont"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[synth]\nsample_rate = 48000";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.synth.sample_rate, 48000);
        assert_eq!(parsed.synth.gain, 0.8);
        assert_eq!(parsed.reverb.default_preset, "hall");
        assert_eq!(parsed.timeouts.notation_secs, 60);
        assert!(!parsed.debug.keep_intermediates_on_failure);
    }

    #[test]
    fn reverb_overrides_are_optional() {
        let parsed: Settings = toml::from_str("[reverb]\nwet_gain = 1.5\nmix_dry = 1.0\n").unwrap();
        assert_eq!(parsed.reverb.wet_gain, Some(1.5));
        assert_eq!(parsed.reverb.mix_dry, Some(1.0));
        assert_eq!(parsed.reverb.dry_gain, None);

        let written = toml::to_string_pretty(&ReverbSettings::default()).unwrap();
        assert!(!written.contains("mix_wet"));
    }

    #[test]
    fn stage_timeouts_map_to_sections() {
        let timeouts = TimeoutSettings {
            notation_secs: 1,
            synthesis_secs: 2,
            encode_secs: 3,
        };
        assert_eq!(timeouts.for_stage(StageName::Notation), Duration::from_secs(1));
        assert_eq!(timeouts.for_stage(StageName::Synthesis), Duration::from_secs(2));
        assert_eq!(timeouts.for_stage(StageName::Encode), Duration::from_secs(3));
    }

    #[test]
    fn relative_resources_hang_off_the_install_dir() {
        let base = Path::new("/opt/abc2piano");
        assert_eq!(
            resolve_resource("resources/bin", Some(base)),
            PathBuf::from("/opt/abc2piano/resources/bin")
        );
        assert_eq!(
            resolve_resource("resources/bin", None),
            PathBuf::from("resources/bin")
        );
    }

    #[test]
    fn absolute_resources_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let soundfont = dir.path().join("piano.sf2");
        let value = soundfont.display().to_string();

        assert_eq!(resolve_resource(&value, Some(Path::new("/opt/abc2piano"))), soundfont);

        let paths = PathSettings {
            soundfont: value,
            ..PathSettings::default()
        };
        assert_eq!(paths.soundfont_path(), soundfont);
    }

    #[test]
    fn default_resources_do_not_depend_on_the_working_dir() {
        let paths = PathSettings::default();
        let exe_dir = install_dir().unwrap();

        assert_eq!(paths.bundled_tools_dir(), exe_dir.join("resources/bin"));
        assert_eq!(paths.impulses_path(), exe_dir.join("resources/impulses"));
        assert!(paths.soundfont_path().is_absolute());
    }

    #[test]
    fn empty_temp_root_falls_back_to_system_temp() {
        let paths = PathSettings::default();
        assert!(paths.temp_root_dir().starts_with(std::env::temp_dir()));
        assert!(paths.output_dir().is_none());
    }
}
