//! Job store: the ordered set of files queued for conversion
//!
//! Insertion order is preserved for listing and reporting; a path-keyed set
//! enforces that each input file appears at most once. The store is owned by
//! the session thread; batch runs work on snapshots, never on the live store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use super::job::JobSettings;
use super::settings::{is_audio_file, SettingsError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Ordered, de-duplicated collection of conversion jobs
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Vec<JobSettings>,
    known_paths: HashSet<PathBuf>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file with default settings.
    ///
    /// Fails if the path does not exist on the filesystem. Re-adding a path
    /// already in the store is a silent no-op; returns whether the file was
    /// actually added.
    pub fn add(&mut self, path: &Path) -> Result<bool, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if self.known_paths.contains(path) {
            return Ok(false);
        }
        self.known_paths.insert(path.to_path_buf());
        self.jobs.push(JobSettings::new(path.to_path_buf()));
        Ok(true)
    }

    /// Recursively queue every audio file under a directory.
    ///
    /// Non-audio files are skipped; duplicates are ignored. Returns the
    /// number of files added.
    pub fn add_dir(&mut self, dir: &Path) -> Result<usize, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound {
                path: dir.to_path_buf(),
            });
        }
        let mut added = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                if self.add(entry.path())? {
                    added += 1;
                }
            }
        }
        log::debug!("scanned {}: {} audio file(s) added", dir.display(), added);
        Ok(added)
    }

    /// Remove a queued file; no-op if it was never added
    pub fn remove(&mut self, path: &Path) {
        if self.known_paths.remove(path) {
            self.jobs.retain(|job| job.input_path() != path);
        }
    }

    /// Update settings for a queued file, applying only the provided fields.
    ///
    /// Fails with `NotFound` for unknown paths and with a validation error
    /// for blank or unrecognized values.
    pub fn update(
        &mut self,
        path: &Path,
        format: Option<&str>,
        quality: Option<&str>,
        sample_rate: Option<&str>,
        channels: Option<&str>,
    ) -> Result<(), StoreError> {
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.input_path() == path)
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_path_buf(),
            })?;
        if let Some(format) = format {
            job.set_format(format)?;
        }
        if let Some(quality) = quality {
            job.set_quality(quality)?;
        }
        if let Some(sample_rate) = sample_rate {
            job.set_sample_rate(sample_rate)?;
        }
        if let Some(channels) = channels {
            job.set_channels(channels)?;
        }
        Ok(())
    }

    /// Ordered copy of all jobs. Later store mutations are not visible
    /// through the snapshot.
    pub fn snapshot(&self) -> Vec<JobSettings> {
        self.jobs.clone()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
        self.known_paths.clear();
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
