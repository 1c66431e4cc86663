//! The per-file transform collaborator
//!
//! The orchestrator treats the transform as an opaque, potentially slow,
//! potentially failing operation. The shipped implementation simulates a
//! conversion: it sleeps proportionally to the input size and then copies
//! the input bytes to the output path. No transcoding happens anywhere.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::core::JobSettings;

/// Per-job conversion failure
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
    #[error("conversion cancelled before start")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

/// Turns one input file into one output file under the job's settings.
///
/// Implementations run on the blocking pool and may take seconds per call.
pub trait Transform: Send + Sync {
    fn convert(&self, job: &JobSettings, output_path: &Path) -> Result<(), TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&JobSettings, &Path) -> Result<(), TransformError> + Send + Sync,
{
    fn convert(&self, job: &JobSettings, output_path: &Path) -> Result<(), TransformError> {
        self(job, output_path)
    }
}

/// Stand-in for a real encoder: size-proportional delay, then a byte copy.
///
/// An existing file at the output path is overwritten.
pub struct SimulatedTransform;

impl SimulatedTransform {
    /// 500 ms base plus 200 ms per MiB of input, capped at 3 s
    fn delay_for(input_size: u64) -> Duration {
        let base_ms = 500;
        let size_ms = (input_size / (1024 * 1024)) * 200;
        Duration::from_millis((base_ms + size_ms).min(3000))
    }
}

impl Transform for SimulatedTransform {
    fn convert(&self, job: &JobSettings, output_path: &Path) -> Result<(), TransformError> {
        let size = fs::metadata(job.input_path())?.len();
        thread::sleep(Self::delay_for(size));
        log::debug!(
            "simulated encode: {} -> {} ({}, {} Hz, {} ch)",
            job.input_name(),
            output_path.display(),
            job.quality(),
            job.sample_rate().hz(),
            job.channels().count()
        );
        fs::copy(job.input_path(), output_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_delay_grows_with_size_and_is_capped() {
        assert_eq!(SimulatedTransform::delay_for(0), Duration::from_millis(500));
        assert_eq!(
            SimulatedTransform::delay_for(2 * 1024 * 1024),
            Duration::from_millis(900)
        );
        assert_eq!(
            SimulatedTransform::delay_for(100 * 1024 * 1024),
            Duration::from_millis(3000)
        );
    }

    #[test]
    fn test_convert_copies_input_bytes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("track.wav");
        fs::write(&input, b"fake audio data").unwrap();

        let job = JobSettings::new(input);
        let output = dir.path().join(job.output_file_name());
        SimulatedTransform.convert(&job, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"fake audio data");
    }

    #[test]
    fn test_convert_overwrites_existing_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("track.wav");
        fs::write(&input, b"new").unwrap();
        let output = dir.path().join("track_converted.mp3");
        fs::write(&output, b"stale").unwrap();

        let job = JobSettings::new(input);
        SimulatedTransform.convert(&job, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"new");
    }

    #[test]
    fn test_convert_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let job = JobSettings::new(PathBuf::from("/nonexistent/track.wav"));
        let output = dir.path().join("out.mp3");
        let result = SimulatedTransform.convert(&job, &output);
        assert!(matches!(result, Err(TransformError::Io(_))));
    }
}
