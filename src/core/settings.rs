//! Output settings vocabulary: formats, quality presets, sample rates, channels
//!
//! These are closed sets. The preset tables are fixed at compile time and
//! looked up by validated enum value, never by raw user strings.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Validation failure for a settings field
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("unsupported output format: {0}")]
    UnknownFormat(String),
    #[error("unsupported sample rate: {0}")]
    UnknownSampleRate(String),
    #[error("unsupported channel layout: {0}")]
    UnknownChannels(String),
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Flac,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::M4a,
        AudioFormat::Flac,
    ];

    /// Parse a user-supplied format string (trimmed, case-insensitive)
    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::Empty("output format"));
        }
        match trimmed.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "m4a" => Ok(AudioFormat::M4a),
            "flac" => Ok(AudioFormat::Flac),
            _ => Err(SettingsError::UnknownFormat(trimmed.to_string())),
        }
    }

    /// File extension for output files of this format
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Supported output sample rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
    Hz22050,
    Hz16000,
    Hz8000,
}

impl SampleRate {
    pub const ALL: [SampleRate; 5] = [
        SampleRate::Hz44100,
        SampleRate::Hz48000,
        SampleRate::Hz22050,
        SampleRate::Hz16000,
        SampleRate::Hz8000,
    ];

    /// Parse "44100" or the display form "44100 Hz"
    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::Empty("sample rate"));
        }
        let digits = trimmed
            .strip_suffix("Hz")
            .map(str::trim_end)
            .unwrap_or(trimmed);
        match digits {
            "44100" => Ok(SampleRate::Hz44100),
            "48000" => Ok(SampleRate::Hz48000),
            "22050" => Ok(SampleRate::Hz22050),
            "16000" => Ok(SampleRate::Hz16000),
            "8000" => Ok(SampleRate::Hz8000),
            _ => Err(SettingsError::UnknownSampleRate(trimmed.to_string())),
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Hz44100 => 44100,
            SampleRate::Hz48000 => 48000,
            SampleRate::Hz22050 => 22050,
            SampleRate::Hz16000 => 16000,
            SampleRate::Hz8000 => 8000,
        }
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// Output channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub const ALL: [Channels; 2] = [Channels::Mono, Channels::Stereo];

    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::Empty("channels"));
        }
        match trimmed.to_lowercase().as_str() {
            "mono" => Ok(Channels::Mono),
            "stereo" => Ok(Channels::Stereo),
            _ => Err(SettingsError::UnknownChannels(trimmed.to_string())),
        }
    }

    /// Channel count (Mono=1, Stereo=2)
    pub fn count(self) -> u32 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channels::Mono => "Mono",
            Channels::Stereo => "Stereo",
        })
    }
}

/// One quality tier available for a given output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPreset {
    pub label: &'static str,
    pub value: &'static str,
    pub ordinal: u8,
}

const MP3_PRESETS: [QualityPreset; 4] = [
    QualityPreset { label: "Economy", value: "64 kbps", ordinal: 0 },
    QualityPreset { label: "Standard", value: "128 kbps", ordinal: 1 },
    QualityPreset { label: "Good", value: "192 kbps", ordinal: 2 },
    QualityPreset { label: "Best", value: "320 kbps", ordinal: 3 },
];

const WAV_PRESETS: [QualityPreset; 4] = [
    QualityPreset { label: "Economy", value: "16-bit", ordinal: 0 },
    QualityPreset { label: "Standard", value: "16-bit", ordinal: 1 },
    QualityPreset { label: "Good", value: "24-bit", ordinal: 2 },
    QualityPreset { label: "Best", value: "24-bit", ordinal: 3 },
];

const FLAC_PRESETS: [QualityPreset; 4] = [
    QualityPreset { label: "Economy", value: "Level 0", ordinal: 0 },
    QualityPreset { label: "Standard", value: "Level 5", ordinal: 1 },
    QualityPreset { label: "Good", value: "Level 5", ordinal: 2 },
    QualityPreset { label: "Best", value: "Level 8", ordinal: 3 },
];

/// Ordered quality tiers for a format
pub fn quality_presets(format: AudioFormat) -> &'static [QualityPreset] {
    match format {
        AudioFormat::Mp3 | AudioFormat::M4a => &MP3_PRESETS,
        AudioFormat::Wav => &WAV_PRESETS,
        AudioFormat::Flac => &FLAC_PRESETS,
    }
}

/// Check if a file is an audio file based on its extension
pub fn is_audio_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(
            ext.as_str(),
            "mp3" | "flac" | "wav" | "ogg" | "m4a" | "aac" | "aiff" | "opus" | "alac"
        )
    } else {
        false
    }
}
