//! Batch conversion engine
//!
//! The orchestrator in `batch` fans jobs out onto a bounded worker pool and
//! reports through an `EventSink`. The actual per-file work is behind the
//! `Transform` trait; the shipped implementation only simulates a conversion.

mod batch;
mod events;
mod progress;
mod transform;

pub use batch::{default_worker_count, run_batch, BatchError, BatchOutcome, JobFailure};
pub use events::{ChannelSink, ConversionEvent, EventSink, LogSink, NullSink};
pub use progress::BatchProgress;
pub use transform::{SimulatedTransform, Transform, TransformError};
