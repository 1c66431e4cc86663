//! Events emitted by a batch run
//!
//! The orchestrator reports through an `EventSink`; the caller decides what
//! to do with the events (print them, drain a channel, assert on them in
//! tests). Sinks must return promptly - the workers call them inline.

use std::sync::mpsc;

/// Events emitted during a batch conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionEvent {
    /// A log line for the session transcript
    Log(String),
    /// Overall completion fraction in [0, 1]
    Progress(f64),
    /// Short description of what is happening right now
    Status(String),
}

/// Observer for batch run events.
///
/// Implementations must not block: they are invoked from worker tasks and a
/// stalled sink would stall the batch.
pub trait EventSink: Send + Sync {
    fn log(&self, message: &str);
    fn progress(&self, fraction: f64);
    fn status(&self, message: &str);
}

/// Sink that forwards events over an unbounded channel.
///
/// The receiver half is drained by the caller, typically on its own thread.
/// Sends never block; events are dropped if the receiver is gone.
pub struct ChannelSink {
    tx: mpsc::Sender<ConversionEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<ConversionEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn log(&self, message: &str) {
        let _ = self.tx.send(ConversionEvent::Log(message.to_string()));
    }

    fn progress(&self, fraction: f64) {
        let _ = self.tx.send(ConversionEvent::Progress(fraction));
    }

    fn status(&self, message: &str) {
        let _ = self.tx.send(ConversionEvent::Status(message.to_string()));
    }
}

/// Sink that routes events to the `log` crate
#[allow(dead_code)] // Alternative sink for embedders that have no terminal
pub struct LogSink;

impl EventSink for LogSink {
    fn log(&self, message: &str) {
        log::info!("{}", message);
    }

    fn progress(&self, fraction: f64) {
        log::debug!("progress: {:.0}%", fraction * 100.0);
    }

    fn status(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Sink that discards everything
#[allow(dead_code)] // Used by orchestrator tests
pub struct NullSink;

impl EventSink for NullSink {
    fn log(&self, _message: &str) {}
    fn progress(&self, _fraction: f64) {}
    fn status(&self, _message: &str) {}
}
