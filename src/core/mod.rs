//! Core job model
//!
//! This module contains:
//! - The settings vocabulary (formats, presets, sample rates, channels)
//! - Per-file job settings with validated mutation
//! - The job store that holds the conversion queue

mod job;
mod settings;
mod store;

pub use job::JobSettings;
pub use settings::{
    is_audio_file, quality_presets, AudioFormat, Channels, QualityPreset, SampleRate,
    SettingsError,
};
pub use store::{JobStore, StoreError};
