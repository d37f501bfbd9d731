//! Normalized platform identification.

use serde::{Deserialize, Serialize};

/// Operating system and architecture pair with a bundled tool layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    LinuxX86_64,
    LinuxAarch64,
    MacosX86_64,
    MacosAarch64,
    WindowsX86_64,
    WindowsAarch64,
}

/// One row of bundled layout data.
struct Layout {
    os: &'static str,
    arch: &'static str,
    dir: &'static str,
    exe_suffix: &'static str,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::LinuxX86_64,
        Platform::LinuxAarch64,
        Platform::MacosX86_64,
        Platform::MacosAarch64,
        Platform::WindowsX86_64,
        Platform::WindowsAarch64,
    ];

    /// Platform of the running process, if it has a bundled layout.
    pub fn current() -> Option<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Look up a platform from `std::env::consts`-style names.
    pub fn from_parts(os: &str, arch: &str) -> Option<Self> {
        let arch = match arch {
            "amd64" | "x64" => "x86_64",
            "arm64" => "aarch64",
            other => other,
        };
        let os = if os == "darwin" { "macos" } else { os };

        Self::ALL.into_iter().find(|p| {
            let layout = p.layout();
            layout.os == os && layout.arch == arch
        })
    }

    fn layout(&self) -> Layout {
        let row = |os, arch, dir, exe_suffix| Layout {
            os,
            arch,
            dir,
            exe_suffix,
        };
        match self {
            Platform::LinuxX86_64 => row("linux", "x86_64", "linux-x86_64", ""),
            Platform::LinuxAarch64 => row("linux", "aarch64", "linux-aarch64", ""),
            Platform::MacosX86_64 => row("macos", "x86_64", "macos-x86_64", ""),
            Platform::MacosAarch64 => row("macos", "aarch64", "macos-aarch64", ""),
            Platform::WindowsX86_64 => row("windows", "x86_64", "windows-x86_64", ".exe"),
            Platform::WindowsAarch64 => row("windows", "aarch64", "windows-aarch64", ".exe"),
        }
    }

    /// Name of the bundled subdirectory for this platform.
    pub fn dir_name(&self) -> &'static str {
        self.layout().dir
    }

    /// Suffix appended to executable names.
    pub fn exe_suffix(&self) -> &'static str {
        self.layout().exe_suffix
    }

    /// File name of `binary` on this platform.
    pub fn executable_name(&self, binary: &str) -> String {
        format!("{}{}", binary, self.exe_suffix())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_arch_aliases() {
        assert_eq!(Platform::from_parts("linux", "amd64"), Some(Platform::LinuxX86_64));
        assert_eq!(Platform::from_parts("darwin", "arm64"), Some(Platform::MacosAarch64));
        assert_eq!(Platform::from_parts("freebsd", "x86_64"), None);
    }

    #[test]
    fn windows_uses_exe_suffix() {
        assert_eq!(Platform::WindowsX86_64.executable_name("ffmpeg"), "ffmpeg.exe");
        assert_eq!(Platform::LinuxAarch64.executable_name("ffmpeg"), "ffmpeg");
        assert_eq!(Platform::MacosX86_64.dir_name(), "macos-x86_64");
    }

    #[test]
    fn every_variant_round_trips_through_its_names() {
        let mut dirs = std::collections::HashSet::new();
        for platform in Platform::ALL {
            let layout = platform.layout();
            assert_eq!(Platform::from_parts(layout.os, layout.arch), Some(platform));
            assert!(dirs.insert(platform.dir_name()), "duplicate dir {}", platform);
        }
    }
}
