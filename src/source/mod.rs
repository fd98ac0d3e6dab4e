//! Ingestion sources.
//!
//! Each source runs on its own OS thread, does its blocking reads outside
//! the model lock and applies lines one at a time through
//! [`SharedModel`](crate::model::SharedModel):
//! - `file`: a trace file, read once or tail-followed
//! - `server`: a TCP server, one thread per connection
//! - `line_buffer`: partial-read reassembly shared by both

use crate::model::{IngestOutcome, SourceGroup};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::warn;

pub mod file;
pub mod line_buffer;
pub mod server;

pub use file::{spawn_file_source, FileSourceOptions, FileTailer};
pub use line_buffer::LineBuffer;
pub use server::{ServerHandle, TraceServer, DEFAULT_PORT};

/// Per-source ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Non-blank lines seen.
    pub lines: u64,
    /// Lines applied to the model.
    pub applied: u64,
    /// Lines rejected (journaled, not applied).
    pub rejected: u64,
}

impl SourceStats {
    /// Count one ingest outcome.
    pub fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Blank => return,
            IngestOutcome::Applied(_) => self.applied += 1,
            IngestOutcome::Rejected(_) => self.rejected += 1,
            IngestOutcome::Comment | IngestOutcome::Unroutable => {}
        }
        self.lines += 1;
    }
}

/// Handle to a running source thread.
#[derive(Debug)]
pub struct SourceHandle {
    name: String,
    group: SourceGroup,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<SourceStats>>,
}

impl SourceHandle {
    pub(crate) fn new(
        name: String,
        group: SourceGroup,
        stop: Arc<AtomicBool>,
        thread: JoinHandle<SourceStats>,
    ) -> Self {
        Self {
            name,
            group,
            stop,
            thread: Some(thread),
        }
    }

    /// Human-readable source name (the path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source group its lines are tagged with.
    pub fn group(&self) -> &SourceGroup {
        &self.group
    }

    /// Ask the thread to stop at its next poll.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread and collect its counters.
    pub fn join(mut self) -> SourceStats {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                warn!(source = %self.name, "Source thread panicked");
                SourceStats::default()
            }
            None => SourceStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngestError, ParseError};
    use crate::parser::CommandKind;

    #[test]
    fn stats_skip_blank_lines() {
        let mut stats = SourceStats::default();
        stats.record(&IngestOutcome::Blank);
        stats.record(&IngestOutcome::Comment);
        stats.record(&IngestOutcome::Applied(CommandKind::Call));
        stats.record(&IngestOutcome::Rejected(IngestError::Parse(
            ParseError::UnknownCommand("X".into()),
        )));
        assert_eq!(
            stats,
            SourceStats {
                lines: 3,
                applied: 1,
                rejected: 1
            }
        );
    }
}
