//! Core enums used throughout the pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Final audio container produced by the encode stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 16-bit PCM WAV, 44.1 kHz.
    #[default]
    Wav,
    /// MP3 at 192 kbps.
    Mp3,
    /// Opus at 96 kbps.
    Opus,
}

/// Error returned when parsing an output format name fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported output format '{0}' (expected one of: wav, mp3, opus)")]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Wav, OutputFormat::Mp3, OutputFormat::Opus];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Opus => "opus",
        }
    }

    /// Encoder codec name.
    pub fn codec(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "pcm_s16le",
            OutputFormat::Mp3 => "libmp3lame",
            OutputFormat::Opus => "libopus",
        }
    }

    /// Target bitrate, `None` for PCM.
    pub fn bitrate(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Wav => None,
            OutputFormat::Mp3 => Some("192k"),
            OutputFormat::Opus => Some("96k"),
        }
    }

    /// Whether `header` starts like a file of this container.
    pub fn matches_signature(&self, header: &[u8]) -> bool {
        match self {
            OutputFormat::Wav => {
                header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE"
            }
            OutputFormat::Mp3 => {
                header.starts_with(b"ID3")
                    || (header.len() >= 2 && header[0] == 0xFF && header[1] & 0xE0 == 0xE0)
            }
            OutputFormat::Opus => header.starts_with(b"OggS"),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension() == normalized)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Logical external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Notation to MIDI converter.
    NotationConverter,
    /// MIDI synthesizer rendering against a sample bank.
    Synthesizer,
    /// Audio encoder and filter processor.
    Encoder,
}

impl ToolName {
    /// Tools in pipeline order.
    pub const ALL: [ToolName; 3] = [
        ToolName::NotationConverter,
        ToolName::Synthesizer,
        ToolName::Encoder,
    ];

    /// Executable name without any platform suffix.
    pub fn binary_name(&self) -> &'static str {
        match self {
            ToolName::NotationConverter => "abc2midi",
            ToolName::Synthesizer => "fluidsynth",
            ToolName::Encoder => "ffmpeg",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// One of the three fixed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    /// Notation file to MIDI.
    Notation,
    /// MIDI to uncompressed audio.
    Synthesis,
    /// Reverb and final encoding.
    Encode,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Notation => "notation",
            StageName::Synthesis => "synthesis",
            StageName::Encode => "encode",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved tool binary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOrigin {
    /// Shipped in the platform-specific bundled directory.
    Bundled,
    /// Found on the executable search path.
    System,
}

impl std::fmt::Display for BinaryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOrigin::Bundled => write!(f, "bundled"),
            BinaryOrigin::System => write!(f, "system"),
        }
    }
}
