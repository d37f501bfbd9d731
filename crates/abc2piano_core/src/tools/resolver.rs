//! Two-step tool resolution: bundled copy first, then the search path.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::platform::Platform;
use crate::models::{BinaryOrigin, ToolName};

/// Errors from tool resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("required tool '{tool}' was found neither in the bundled directory nor on PATH")]
    ToolNotFound { tool: ToolName },
}

/// A resolved executable for one logical tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolBinary {
    pub tool: ToolName,
    pub path: PathBuf,
    pub origin: BinaryOrigin,
}

/// All three pipeline tools, resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTools {
    pub notation: ToolBinary,
    pub synthesizer: ToolBinary,
    pub encoder: ToolBinary,
}

impl ResolvedTools {
    pub fn get(&self, tool: ToolName) -> &ToolBinary {
        match tool {
            ToolName::NotationConverter => &self.notation,
            ToolName::Synthesizer => &self.synthesizer,
            ToolName::Encoder => &self.encoder,
        }
    }
}

/// Resolves logical tool names to executables.
///
/// Results are cached per tool for the lifetime of the resolver.
pub struct BinaryResolver {
    /// Root holding one subdirectory per platform.
    bundled_root: Option<PathBuf>,
    platform: Option<Platform>,
    /// Search path override (`None` reads `PATH` at lookup time).
    search_path: Option<OsString>,
    cache: Mutex<HashMap<ToolName, ToolBinary>>,
}

impl BinaryResolver {
    /// Resolver for the current platform with the given bundled root.
    pub fn new(bundled_root: impl Into<PathBuf>) -> Self {
        Self {
            bundled_root: Some(bundled_root.into()),
            platform: Platform::current(),
            search_path: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver that only consults the search path.
    pub fn system_only() -> Self {
        Self {
            bundled_root: None,
            platform: Platform::current(),
            search_path: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Override the platform used to pick the bundled subdirectory.
    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    /// Search these directories instead of `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Directory the bundled tools for this platform would live in.
    pub fn bundled_dir(&self) -> Option<PathBuf> {
        match (&self.bundled_root, self.platform) {
            (Some(root), Some(platform)) => Some(root.join(platform.dir_name())),
            _ => None,
        }
    }

    /// Resolve one tool, preferring the bundled copy.
    pub fn resolve(&self, tool: ToolName) -> Result<ToolBinary, ResolveError> {
        if let Some(hit) = self.cache.lock().get(&tool) {
            return Ok(hit.clone());
        }

        let binary = self
            .find_bundled(tool)
            .map(|path| ToolBinary {
                tool,
                path,
                origin: BinaryOrigin::Bundled,
            })
            .or_else(|| {
                self.find_on_search_path(tool).map(|path| ToolBinary {
                    tool,
                    path,
                    origin: BinaryOrigin::System,
                })
            })
            .ok_or(ResolveError::ToolNotFound { tool })?;

        tracing::debug!(
            "Resolved {} -> {} ({})",
            tool,
            binary.path.display(),
            binary.origin
        );

        self.cache.lock().insert(tool, binary.clone());
        Ok(binary)
    }

    /// Resolve every pipeline tool, failing on the first missing one.
    pub fn resolve_all(&self) -> Result<ResolvedTools, ResolveError> {
        Ok(ResolvedTools {
            notation: self.resolve(ToolName::NotationConverter)?,
            synthesizer: self.resolve(ToolName::Synthesizer)?,
            encoder: self.resolve(ToolName::Encoder)?,
        })
    }

    /// Forget cached resolutions.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn find_bundled(&self, tool: ToolName) -> Option<PathBuf> {
        let dir = self.bundled_dir()?;
        let platform = self.platform?;
        let candidate = dir.join(platform.executable_name(tool.binary_name()));
        is_executable(&candidate).then_some(candidate)
    }

    fn find_on_search_path(&self, tool: ToolName) -> Option<PathBuf> {
        let path_var = match self.search_path {
            Some(ref p) => p.clone(),
            None => std::env::var_os("PATH")?,
        };
        let suffix = self.platform.map(|p| p.exe_suffix()).unwrap_or("");

        std::env::split_paths(&path_var).find_map(|dir| {
            let plain = dir.join(tool.binary_name());
            if is_executable(&plain) {
                return Some(plain);
            }
            if !suffix.is_empty() {
                let suffixed = dir.join(format!("{}{}", tool.binary_name(), suffix));
                if is_executable(&suffixed) {
                    return Some(suffixed);
                }
            }
            None
        })
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn bundled_copy_wins_over_system() {
        let dir = tempdir().unwrap();
        let bundled = dir.path().join("bin");
        let system = dir.path().join("usr-bin");

        let platform = Platform::LinuxX86_64;
        make_executable(&bundled.join(platform.dir_name()).join("ffmpeg"));
        make_executable(&system.join("ffmpeg"));

        let resolver = BinaryResolver::new(&bundled)
            .with_platform(Some(platform))
            .with_search_path(system.as_os_str());

        let binary = resolver.resolve(ToolName::Encoder).unwrap();
        assert_eq!(binary.origin, BinaryOrigin::Bundled);
        assert_eq!(binary.path, bundled.join("linux-x86_64").join("ffmpeg"));
    }

    #[cfg(unix)]
    #[test]
    fn falls_back_to_search_path() {
        let dir = tempdir().unwrap();
        let system = dir.path().join("usr-bin");
        make_executable(&system.join("abc2midi"));

        // Bundled root exists but has no directory for this platform.
        let resolver = BinaryResolver::new(dir.path().join("missing"))
            .with_platform(Some(Platform::LinuxX86_64))
            .with_search_path(system.as_os_str());

        let binary = resolver.resolve(ToolName::NotationConverter).unwrap();
        assert_eq!(binary.origin, BinaryOrigin::System);
        assert_eq!(binary.path, system.join("abc2midi"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_bundled_file_is_skipped() {
        let dir = tempdir().unwrap();
        let bundled_dir = dir.path().join("bin").join("linux-x86_64");
        fs::create_dir_all(&bundled_dir).unwrap();
        fs::write(bundled_dir.join("fluidsynth"), "not a program").unwrap();

        let system = dir.path().join("usr-bin");
        make_executable(&system.join("fluidsynth"));

        let resolver = BinaryResolver::new(dir.path().join("bin"))
            .with_platform(Some(Platform::LinuxX86_64))
            .with_search_path(system.as_os_str());

        let binary = resolver.resolve(ToolName::Synthesizer).unwrap();
        assert_eq!(binary.origin, BinaryOrigin::System);
    }

    #[test]
    fn missing_everywhere_is_tool_not_found() {
        let dir = tempdir().unwrap();
        let resolver = BinaryResolver::new(dir.path())
            .with_platform(Some(Platform::LinuxX86_64))
            .with_search_path(dir.path().as_os_str());

        assert_eq!(
            resolver.resolve(ToolName::Encoder),
            Err(ResolveError::ToolNotFound {
                tool: ToolName::Encoder
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn resolve_all_reports_first_missing_tool() {
        let dir = tempdir().unwrap();
        let system = dir.path().join("usr-bin");
        make_executable(&system.join("abc2midi"));
        make_executable(&system.join("ffmpeg"));

        let resolver = BinaryResolver::system_only().with_search_path(system.as_os_str());

        let err = resolver.resolve_all().unwrap_err();
        assert_eq!(
            err,
            ResolveError::ToolNotFound {
                tool: ToolName::Synthesizer
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn cache_survives_until_cleared() {
        let dir = tempdir().unwrap();
        let system = dir.path().join("usr-bin");
        let tool = system.join("ffmpeg");
        make_executable(&tool);

        let resolver = BinaryResolver::system_only().with_search_path(system.as_os_str());
        resolver.resolve(ToolName::Encoder).unwrap();

        fs::remove_file(&tool).unwrap();
        assert!(resolver.resolve(ToolName::Encoder).is_ok());

        resolver.clear_cache();
        assert!(resolver.resolve(ToolName::Encoder).is_err());
    }
}
