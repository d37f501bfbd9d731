//! Named reverb presets.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

/// Name of the sentinel preset that disables convolution.
pub const NONE_PRESET: &str = "none";

/// Valid range of the convolution filter's dry and wet gains.
pub const GAIN_RANGE: (f64, f64) = (0.0, 10.0);

/// Equal dry and wet weights in the final mix.
pub const EVEN_MIX: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReverbError {
    #[error("unknown reverb preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverbPreset {
    /// Lookup key.
    pub name: &'static str,
    /// Human label.
    pub label: &'static str,
    /// Impulse response file name; `None` only for the sentinel.
    pub impulse: Option<&'static str>,
    /// Input gain of the convolution filter.
    pub dry_gain: f64,
    /// Output gain of the convolution filter.
    pub wet_gain: f64,
    /// Share of the wet branch in the final mix, in `[0, 1]`. Every real
    /// preset mixes both branches evenly.
    pub mix: f64,
}

impl ReverbPreset {
    /// Whether this preset skips convolution entirely.
    pub fn is_none(&self) -> bool {
        self.impulse.is_none()
    }

    /// Impulse response path under `impulses_dir`.
    pub fn impulse_path(&self, impulses_dir: &Path) -> Option<PathBuf> {
        self.impulse.map(|file| impulses_dir.join(file))
    }
}

/// Read-only preset table.
#[derive(Debug)]
pub struct ReverbCatalog {
    presets: Vec<ReverbPreset>,
}

impl ReverbCatalog {
    fn builtin() -> Self {
        fn preset(
            name: &'static str,
            label: &'static str,
            impulse: Option<&'static str>,
            dry_gain: f64,
            wet_gain: f64,
            mix: f64,
        ) -> ReverbPreset {
            ReverbPreset {
                name,
                label,
                impulse,
                dry_gain,
                wet_gain,
                mix,
            }
        }

        Self {
            presets: vec![
                preset(NONE_PRESET, "None", None, 1.0, 0.0, 0.0),
                preset("dry-studio", "Dry studio", Some("IRx125_01A_dry-studio.wav"), 1.2, 0.6, EVEN_MIX),
                preset("small-room", "Small room", Some("IRx250_01A_small-room.wav"), 1.0, 0.9, EVEN_MIX),
                preset("hall", "Concert hall", Some("IRx500_01A_concert-hall.wav"), 4.0, 1.0, EVEN_MIX),
                preset("wide-hall", "Wide hall", Some("IRx500_02A_wide-hall.wav"), 0.9, 1.2, EVEN_MIX),
                preset("grand-hall", "Grand hall", Some("IRx1000_01A_grand-hall.wav"), 0.8, 1.3, EVEN_MIX),
                preset("cinematic-hall", "Cinematic hall", Some("IRx1000_02A_cinematic-hall.wav"), 0.7, 1.4, EVEN_MIX),
            ],
        }
    }

    /// Look up a preset by name or label, ignoring case.
    pub fn get(&self, name: &str) -> Result<&ReverbPreset, ReverbError> {
        let wanted = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted) || p.label.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReverbError::UnknownPreset {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Preset names in table order.
    pub fn names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReverbPreset> {
        self.presets.iter()
    }
}

static CATALOG: Lazy<ReverbCatalog> = Lazy::new(ReverbCatalog::builtin);

/// The process-wide preset catalog.
pub fn catalog() -> &'static ReverbCatalog {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_in_range() {
        for preset in catalog().iter() {
            assert!((0.0..=1.0).contains(&preset.mix), "{}", preset.name);
            assert!(preset.dry_gain >= GAIN_RANGE.0 && preset.dry_gain <= GAIN_RANGE.1);
            assert!(preset.wet_gain >= GAIN_RANGE.0 && preset.wet_gain <= GAIN_RANGE.1);
        }
    }

    #[test]
    fn real_presets_mix_evenly() {
        for preset in catalog().iter().filter(|p| !p.is_none()) {
            assert_eq!(preset.mix, EVEN_MIX, "{}", preset.name);
        }
    }

    #[test]
    fn names_resolve_to_themselves() {
        for name in catalog().names() {
            assert_eq!(catalog().get(name).unwrap().name, name);
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = catalog().get("not-a-real-preset").unwrap_err();
        let ReverbError::UnknownPreset { name, available } = err;
        assert_eq!(name, "not-a-real-preset");
        assert!(available.contains("hall"));
    }

    #[test]
    fn labels_and_case_are_accepted() {
        assert_eq!(catalog().get("Concert hall").unwrap().name, "hall");
        assert_eq!(catalog().get("GRAND-HALL").unwrap().name, "grand-hall");
    }

    #[test]
    fn none_is_a_sentinel() {
        let none = catalog().get(NONE_PRESET).unwrap();
        assert!(none.is_none());
        assert_eq!(none.impulse_path(Path::new("/ir")), None);

        let hall = catalog().get("hall").unwrap();
        assert_eq!(
            hall.impulse_path(Path::new("/ir")),
            Some(PathBuf::from("/ir/IRx500_01A_concert-hall.wav"))
        );
    }
}
