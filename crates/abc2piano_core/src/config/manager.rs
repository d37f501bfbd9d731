//! Loads and persists `abc2piano.toml`.
//!
//! Writes go through a sibling `.toml.tmp` file that is renamed over the
//! target, so a crash never leaves a half-written config. Section updates
//! edit the existing document with `toml_edit` and keep comments elsewhere.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not edit config: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("no config file at {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings and the file they came from.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for `config_path`, holding defaults until loaded.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Read the file; a missing file is an error.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.is_file() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }
        self.settings = toml::from_str(&fs::read_to_string(&self.config_path)?)?;
        Ok(())
    }

    /// Read the file, or write a default one when there is none.
    ///
    /// A file with unknown tables or missing keys is rewritten in full so
    /// every option shows up with its default.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.is_file() {
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;

        if self.is_incomplete(&content.parse()?)? {
            tracing::debug!("Filling in defaults in {}", self.config_path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the log folder and the temp root.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [PathBuf::from(&paths.logs_folder), paths.temp_root_dir()] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Rewrite the whole file from the in-memory settings.
    pub fn save(&self) -> ConfigResult<()> {
        let mut out = String::from("# abc2piano configuration\n\n");
        for section in ConfigSection::ALL {
            out.push_str(section.comment());
            out.push_str(&format!("\n[{}]\n", section.table_name()));
            out.push_str(&self.section_toml(section)?);
            out.push('\n');
        }
        self.atomic_write(&out)?;
        Ok(())
    }

    /// Replace one table on disk, leaving the rest of the file untouched.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) => content.parse::<DocumentMut>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        doc[section.table_name()] = Item::Table(self.section_table(section)?);
        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        Ok(match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Synth => toml::to_string_pretty(&s.synth)?,
            ConfigSection::Reverb => toml::to_string_pretty(&s.reverb)?,
            ConfigSection::Timeouts => toml::to_string_pretty(&s.timeouts)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
            ConfigSection::Debug => toml::to_string_pretty(&s.debug)?,
        })
    }

    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let doc: DocumentMut = self.section_toml(section)?.parse()?;
        Ok(doc.as_table().clone())
    }

    /// Whether `doc` lacks a known key or carries an unknown table.
    fn is_incomplete(&self, doc: &DocumentMut) -> ConfigResult<bool> {
        let unknown_table = doc
            .iter()
            .any(|(key, _)| ConfigSection::ALL.iter().all(|s| s.table_name() != key));
        if unknown_table {
            return Ok(true);
        }

        for section in ConfigSection::ALL {
            let Some(on_disk) = doc.get(section.table_name()).and_then(Item::as_table) else {
                return Ok(true);
            };
            let expected = self.section_table(section)?;
            if expected.iter().any(|(key, _)| !on_disk.contains_key(key)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.config_path.with_extension("toml.tmp");
        let mut file = fs::File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &self.config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("abc2piano.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[paths]"));
        assert!(content.contains("[reverb]"));
        assert!(content.contains("# Per-stage timeouts (seconds)"));
    }

    #[test]
    fn generated_file_parses_back() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("abc2piano.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.settings_mut().synth.sample_rate = 48_000;
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().synth.sample_rate, 48_000);
        assert_eq!(reloaded.settings().reverb.default_preset, "hall");
    }

    #[test]
    fn load_or_create_preserves_existing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("abc2piano.toml");

        fs::write(&config_path, "[paths]\nsoundfont = \"/opt/piano.sf2\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().paths.soundfont, "/opt/piano.sf2");
        // Missing keys were filled in on disk.
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[timeouts]"));
        assert!(content.contains("/opt/piano.sf2"));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("abc2piano.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        manager.settings_mut().reverb.use_limiter = false;
        manager.update_section(ConfigSection::Reverb).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("use_limiter = false"));
        assert!(content.contains("[paths]"));
        assert!(content.contains("# Assets, bundled tools and working directories"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn atomic_write_creates_no_temp_on_success() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("abc2piano.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!config_path.with_extension("toml.tmp").exists());
    }
}
