//! Batch conversion orchestrator
//!
//! Fans one task per job out onto a bounded worker pool, drives the
//! transform collaborator, aggregates completions into progress events and
//! collects per-job failures. The run joins every dispatched task before
//! returning; a failing job never aborts its siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::core::JobSettings;

use super::events::EventSink;
use super::progress::BatchProgress;
use super::transform::{Transform, TransformError};

/// Precondition failure; the whole run aborts before any job starts
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no input files provided")]
    EmptyBatch,
    #[error("invalid output directory {}: {reason}", path.display())]
    InvalidOutputDirectory { path: PathBuf, reason: String },
}

/// One job that did not produce an output, with its cause
#[derive(Debug)]
pub struct JobFailure {
    pub job: JobSettings,
    pub error: TransformError,
}

/// Terminal outcome of one batch run
#[derive(Debug)]
pub enum BatchOutcome {
    AllSucceeded {
        completed: usize,
    },
    PartialFailure {
        completed: usize,
        failures: Vec<JobFailure>,
    },
}

/// Calculate the default number of parallel workers based on CPU cores.
///
/// Uses 75% of cores, clamped between 2 and 8.
pub fn default_worker_count() -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    ((available as f32 * 0.75).ceil() as usize).clamp(2, 8)
}

fn validate_output_dir(dir: &Path) -> Result<(), BatchError> {
    let invalid = |reason: &str| BatchError::InvalidOutputDirectory {
        path: dir.to_path_buf(),
        reason: reason.to_string(),
    };
    if !dir.exists() {
        return Err(invalid("directory does not exist"));
    }
    if !dir.is_dir() {
        return Err(invalid("path is not a directory"));
    }
    // Probe writability rather than trusting permission bits
    let probe = dir.join(".audiobatch-write-check");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            Ok(())
        }
        Err(e) => Err(invalid(&format!("directory is not writable: {}", e))),
    }
}

/// Assign each job its output path, in job order.
///
/// Distinct inputs with the same base name and target format would collide;
/// later jobs get a numeric suffix (`track_converted_2.mp3`) so every job
/// keeps its own output.
fn plan_output_paths(jobs: &[JobSettings], output_dir: &Path) -> Vec<PathBuf> {
    let mut taken: HashSet<String> = HashSet::new();
    jobs.iter()
        .map(|job| {
            let mut name = job.output_file_name();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}_{}.{}", job.output_stem(), n, job.format().extension());
                n += 1;
            }
            output_dir.join(name)
        })
        .collect()
}

/// Run one batch conversion to completion.
///
/// Precondition failures return `Err` before anything is dispatched.
/// Per-job failures are collected and reported through the outcome; a run
/// always ends in either `AllSucceeded` or `PartialFailure`.
///
/// Setting `cancel` stops dispatching new jobs; jobs already in flight run
/// to completion and keep their outputs, while undispatched jobs appear in
/// the outcome as cancelled failures.
pub async fn run_batch(
    jobs: Vec<JobSettings>,
    output_dir: &Path,
    transform: Arc<dyn Transform>,
    sink: Arc<dyn EventSink>,
    cancel: Arc<AtomicBool>,
    worker_count: usize,
) -> Result<BatchOutcome, BatchError> {
    if jobs.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    validate_output_dir(output_dir)?;

    let total = jobs.len();
    let output_paths = plan_output_paths(&jobs, output_dir);
    let progress = Arc::new(BatchProgress::new(total));
    let failures: Arc<Mutex<Vec<JobFailure>>> = Arc::new(Mutex::new(Vec::new()));
    // Completed-count increment and its progress event are emitted under
    // this lock so observed fractions never decrease.
    let completion_lock = Arc::new(Mutex::new(()));
    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));

    sink.log(&format!("Starting batch conversion of {} file(s)", total));
    sink.log(&format!("Output directory: {}", output_dir.display()));
    log::info!(
        "starting batch: {} file(s), {} worker(s), output {}",
        total,
        worker_count.max(1),
        output_dir.display()
    );

    let mut tasks = FuturesUnordered::new();

    for (index, (job, output_path)) in jobs.into_iter().zip(output_paths).enumerate() {
        // Check for cancellation before starting each new job
        if cancel.load(Ordering::SeqCst) {
            log::info!("cancellation requested - not dispatching {}", job.input_name());
            failures.lock().unwrap().push(JobFailure {
                job,
                error: TransformError::Cancelled,
            });
            continue;
        }

        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let transform = transform.clone();
        let sink = sink.clone();
        let progress = progress.clone();
        let failures = failures.clone();
        let completion_lock = completion_lock.clone();
        let file_index = index + 1;

        tasks.push(tokio::spawn(async move {
            let input_name = job.input_name();
            sink.status(&format!("Converting: {}", input_name));
            sink.log(&format!(
                "Processing file {}/{}: {}",
                file_index, total, input_name
            ));
            sink.log(&format!("   Settings: {}", job.summary()));
            log::debug!(
                "converting {} -> {}",
                job.input_path().display(),
                output_path.display()
            );

            let blocking_job = job.clone();
            let blocking_output = output_path.clone();
            let blocking_transform = transform.clone();
            let result = tokio::task::spawn_blocking(move || {
                blocking_transform.convert(&blocking_job, &blocking_output)
            })
            .await
            .unwrap_or_else(|e| {
                Err(TransformError::Failed(format!(
                    "conversion task panicked: {}",
                    e
                )))
            });

            match result {
                Ok(()) => {
                    let output_name = output_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| output_path.display().to_string());
                    let guard = completion_lock.lock().unwrap();
                    let completed = progress.increment_completed();
                    sink.progress(progress.fraction(completed));
                    sink.log(&format!(
                        "Completed: {} ({}/{})",
                        output_name, completed, total
                    ));
                    drop(guard);
                }
                Err(error) => {
                    progress.increment_failed();
                    sink.log(&format!("Failed: {} - {}", input_name, error));
                    log::error!("failed to convert {}: {}", input_name, error);
                    failures.lock().unwrap().push(JobFailure { job, error });
                }
            }

            drop(permit);
        }));
    }

    // Join every dispatched task before producing the outcome
    while let Some(joined) = tasks.next().await {
        if let Err(e) = joined {
            log::error!("conversion worker task failed to join: {}", e);
        }
    }

    let failures = std::mem::take(&mut *failures.lock().unwrap());
    let completed = progress.completed_count();

    if failures.is_empty() {
        sink.status("All conversions completed successfully!");
        sink.log("Batch conversion completed successfully!");
        log::info!("batch complete: {}/{} file(s) converted", completed, total);
        Ok(BatchOutcome::AllSucceeded { completed })
    } else {
        sink.status("Conversion finished with errors");
        sink.log(&format!(
            "{} of {} conversion(s) failed",
            failures.len(),
            total
        ));
        // failures also holds jobs never dispatched after a cancellation
        let failed = progress.failed_count();
        log::warn!(
            "batch finished with errors: {} completed, {} failed, {} not dispatched",
            completed,
            failed,
            failures.len() - failed
        );
        Ok(BatchOutcome::PartialFailure {
            completed,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::events::{ChannelSink, ConversionEvent, NullSink};
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn make_job(dir: &TempDir, name: &str) -> JobSettings {
        let path = dir.path().join(name);
        fs::write(&path, b"fake audio data").unwrap();
        JobSettings::new(path)
    }

    /// Transform that copies immediately, counting invocations
    fn counting_copy(counter: Arc<AtomicUsize>) -> Arc<dyn Transform> {
        Arc::new(
            move |job: &JobSettings, output: &Path| -> Result<(), TransformError> {
                counter.fetch_add(1, Ordering::SeqCst);
                fs::copy(job.input_path(), output)?;
                Ok(())
            },
        )
    }

    fn not_cancelled() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let out = TempDir::new().unwrap();
        let result = run_batch(
            Vec::new(),
            out.path(),
            Arc::new(SimulatedCopy),
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await;
        assert!(matches!(result, Err(BatchError::EmptyBatch)));
    }

    // Minimal stand-in so precondition tests need no closure plumbing
    struct SimulatedCopy;
    impl Transform for SimulatedCopy {
        fn convert(&self, job: &JobSettings, output: &Path) -> Result<(), TransformError> {
            fs::copy(job.input_path(), output)?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_output_dir_dispatches_nothing() {
        let src = TempDir::new().unwrap();
        let jobs = vec![make_job(&src, "a.wav")];
        let calls = Arc::new(AtomicUsize::new(0));

        let result = run_batch(
            jobs,
            Path::new("/nonexistent/output"),
            counting_copy(calls.clone()),
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await;

        assert!(matches!(
            result,
            Err(BatchError::InvalidOutputDirectory { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_output_dir_must_be_a_directory() {
        let src = TempDir::new().unwrap();
        let jobs = vec![make_job(&src, "a.wav")];
        let file_path = src.path().join("not-a-dir");
        fs::write(&file_path, b"").unwrap();

        let result = run_batch(
            jobs,
            &file_path,
            Arc::new(SimulatedCopy),
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await;
        assert!(matches!(
            result,
            Err(BatchError::InvalidOutputDirectory { .. })
        ));
    }

    #[tokio::test]
    async fn test_two_file_batch_succeeds_with_expected_names() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut a = make_job(&src, "a.wav");
        a.set_format("mp3").unwrap();
        a.set_quality("128 kbps").unwrap();
        let mut b = make_job(&src, "b.flac");
        b.set_format("wav").unwrap();
        b.set_quality("16-bit").unwrap();
        b.set_sample_rate("48000").unwrap();
        b.set_channels("Mono").unwrap();

        let outcome = run_batch(
            vec![a, b],
            out.path(),
            Arc::new(SimulatedCopy),
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, BatchOutcome::AllSucceeded { .. }));
        assert!(out.path().join("a_converted.mp3").exists());
        assert!(out.path().join("b_converted.wav").exists());
    }

    #[tokio::test]
    async fn test_dispatches_exactly_one_transform_per_job() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs: Vec<JobSettings> = (0..5)
            .map(|i| make_job(&src, &format!("track{}.wav", i)))
            .collect();
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = run_batch(
            jobs,
            out.path(),
            counting_copy(calls.clone()),
            Arc::new(NullSink),
            not_cancelled(),
            3,
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match outcome {
            BatchOutcome::AllSucceeded { completed } => assert_eq!(completed, 5),
            other => panic!("expected AllSucceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_one() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs: Vec<JobSettings> = (0..8)
            .map(|i| make_job(&src, &format!("track{}.wav", i)))
            .collect();
        let (sink, rx) = ChannelSink::new();

        let outcome = run_batch(
            jobs,
            out.path(),
            Arc::new(SimulatedCopy),
            Arc::new(sink),
            not_cancelled(),
            4,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, BatchOutcome::AllSucceeded { .. }));

        let fractions: Vec<f64> = rx
            .try_iter()
            .filter_map(|event| match event {
                ConversionEvent::Progress(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(fractions.len(), 8);
        for pair in fractions.windows(2) {
            assert!(pair[1] >= pair[0], "progress went backwards: {:?}", fractions);
        }
        assert_eq!(*fractions.last().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_siblings() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![
            make_job(&src, "first.wav"),
            make_job(&src, "bad.wav"),
            make_job(&src, "third.wav"),
        ];

        let failing: Arc<dyn Transform> = Arc::new(
            |job: &JobSettings, output: &Path| -> Result<(), TransformError> {
                if job.input_name().starts_with("bad") {
                    return Err(TransformError::Failed("simulated encoder fault".into()));
                }
                fs::copy(job.input_path(), output)?;
                Ok(())
            },
        );

        let outcome = run_batch(
            jobs,
            out.path(),
            failing,
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await
        .unwrap();

        match outcome {
            BatchOutcome::PartialFailure {
                completed,
                failures,
            } => {
                assert_eq!(completed, 2);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].job.input_name(), "bad.wav");
                assert!(matches!(failures[0].error, TransformError::Failed(_)));
            }
            other => panic!("expected PartialFailure, got {:?}", other),
        }
        assert!(out.path().join("first_converted.mp3").exists());
        assert!(out.path().join("third_converted.mp3").exists());
        assert!(!out.path().join("bad_converted.mp3").exists());
    }

    #[tokio::test]
    async fn test_precancelled_run_dispatches_nothing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![make_job(&src, "a.wav"), make_job(&src, "b.wav")];
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = run_batch(
            jobs,
            out.path(),
            counting_copy(calls.clone()),
            Arc::new(NullSink),
            Arc::new(AtomicBool::new(true)),
            2,
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match outcome {
            BatchOutcome::PartialFailure {
                completed,
                failures,
            } => {
                assert_eq!(completed, 0);
                assert_eq!(failures.len(), 2);
                assert!(failures
                    .iter()
                    .all(|f| matches!(f.error, TransformError::Cancelled)));
            }
            other => panic!("expected PartialFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_base_name_inputs_get_distinct_outputs() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // Same base name, different source extensions, same target format
        let jobs = vec![make_job(&src, "track.mp3"), make_job(&src, "track.wav")];

        let outcome = run_batch(
            jobs,
            out.path(),
            Arc::new(SimulatedCopy),
            Arc::new(NullSink),
            not_cancelled(),
            2,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, BatchOutcome::AllSucceeded { .. }));
        assert!(out.path().join("track_converted.mp3").exists());
        assert!(out.path().join("track_converted_2.mp3").exists());
    }

    #[tokio::test]
    async fn test_status_and_log_events_bracket_each_job() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let jobs = vec![make_job(&src, "a.wav")];
        let (sink, rx) = ChannelSink::new();

        run_batch(
            jobs,
            out.path(),
            Arc::new(SimulatedCopy),
            Arc::new(sink),
            not_cancelled(),
            1,
        )
        .await
        .unwrap();

        let events: Vec<ConversionEvent> = rx.try_iter().collect();
        let status_pos = events
            .iter()
            .position(|e| matches!(e, ConversionEvent::Status(s) if s == "Converting: a.wav"))
            .expect("converting status not emitted");
        let progress_pos = events
            .iter()
            .position(|e| matches!(e, ConversionEvent::Progress(_)))
            .expect("progress not emitted");
        let completed_pos = events
            .iter()
            .position(|e| matches!(e, ConversionEvent::Log(s) if s.starts_with("Completed:")))
            .expect("completion log not emitted");
        assert!(status_pos < progress_pos);
        assert!(progress_pos < completed_pos);
    }

    #[test]
    fn test_default_worker_count_is_clamped() {
        let count = default_worker_count();
        assert!((2..=8).contains(&count));
    }

    #[test]
    fn test_plan_output_paths_without_collisions() {
        let jobs = vec![
            JobSettings::new(PathBuf::from("/in/a.wav")),
            JobSettings::new(PathBuf::from("/in/b.wav")),
        ];
        let paths = plan_output_paths(&jobs, Path::new("/out"));
        assert_eq!(paths[0], Path::new("/out/a_converted.mp3"));
        assert_eq!(paths[1], Path::new("/out/b_converted.mp3"));
    }

    #[test]
    fn test_plan_output_paths_disambiguates_in_order() {
        let jobs = vec![
            JobSettings::new(PathBuf::from("/in/track.mp3")),
            JobSettings::new(PathBuf::from("/in/track.wav")),
            JobSettings::new(PathBuf::from("/in/track.flac")),
        ];
        let paths = plan_output_paths(&jobs, Path::new("/out"));
        assert_eq!(paths[0], Path::new("/out/track_converted.mp3"));
        assert_eq!(paths[1], Path::new("/out/track_converted_2.mp3"));
        assert_eq!(paths[2], Path::new("/out/track_converted_3.mp3"));
    }
}
