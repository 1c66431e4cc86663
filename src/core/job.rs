//! Per-file conversion settings
//!
//! One `JobSettings` describes one input file and its target output settings.
//! Mutation goes through validating setters so a job can never hold a blank
//! or unrecognized value.

use std::path::{Path, PathBuf};

use super::settings::{quality_presets, AudioFormat, Channels, SampleRate, SettingsError};

/// Suffix inserted between the input base name and the target extension
const OUTPUT_SUFFIX: &str = "_converted";

/// A file to be converted, with its target settings
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    input_path: PathBuf,
    format: AudioFormat,
    quality: String,
    sample_rate: SampleRate,
    channels: Channels,
}

impl JobSettings {
    /// Create a job with the default settings: mp3 at the "Good" preset
    /// (192 kbps), 44100 Hz, Stereo
    pub fn new(input_path: PathBuf) -> Self {
        let format = AudioFormat::Mp3;
        Self {
            input_path,
            format,
            quality: quality_presets(format)[2].value.to_string(),
            sample_rate: SampleRate::Hz44100,
            channels: Channels::Stereo,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Input file name for display, lossy on non-UTF-8 paths
    pub fn input_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn set_format(&mut self, format: &str) -> Result<(), SettingsError> {
        self.format = AudioFormat::parse(format)?;
        Ok(())
    }

    /// Quality labels are free-form preset values; only blankness is rejected
    pub fn set_quality(&mut self, quality: &str) -> Result<(), SettingsError> {
        let trimmed = quality.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::Empty("quality"));
        }
        self.quality = trimmed.to_string();
        Ok(())
    }

    pub fn set_sample_rate(&mut self, sample_rate: &str) -> Result<(), SettingsError> {
        self.sample_rate = SampleRate::parse(sample_rate)?;
        Ok(())
    }

    pub fn set_channels(&mut self, channels: &str) -> Result<(), SettingsError> {
        self.channels = Channels::parse(channels)?;
        Ok(())
    }

    /// Output file stem: input base name without its final extension,
    /// plus the conversion suffix
    pub fn output_stem(&self) -> String {
        let base = self
            .input_path
            .file_stem()
            .or_else(|| self.input_path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        format!("{}{}", base, OUTPUT_SUFFIX)
    }

    /// Output file name inside the output directory
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.output_stem(), self.format.extension())
    }

    /// One-line settings summary for log output
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.format.extension().to_uppercase(),
            self.quality,
            self.sample_rate,
            self.channels
        )
    }
}
