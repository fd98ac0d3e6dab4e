//! Lock-guarded model handle shared by sources and the viewer.

use super::identifiers::SourceGroup;
use super::sequence::{IngestOutcome, SequenceModel};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to the one [`SequenceModel`].
///
/// One coarse lock guards the whole model: every ingest and every traversal
/// takes it. Sources do their blocking I/O before locking and hold the lock
/// only to apply a line.
#[derive(Debug, Clone, Default)]
pub struct SharedModel {
    inner: Arc<Mutex<SequenceModel>>,
}

impl SharedModel {
    /// Wrap a model.
    pub fn new(model: SequenceModel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    /// Lock the model.
    ///
    /// The lock is not reentrant. While the guard is alive, work through
    /// the guard only: calling another `SharedModel` method (or `lock`
    /// again) on the same thread deadlocks. The convenience methods below
    /// each take and release the lock within the call.
    pub fn lock(&self) -> MutexGuard<'_, SequenceModel> {
        self.inner.lock()
    }

    /// Apply one line under the lock.
    pub fn ingest(&self, line: &str, group: &SourceGroup) -> IngestOutcome {
        self.inner.lock().ingest(line, group)
    }

    /// Allocate a fresh source group under the lock.
    pub fn allocate_source_group(&self) -> SourceGroup {
        self.inner.lock().allocate_source_group()
    }

    /// Terminate a source group under the lock.
    pub fn terminate_group(&self, group: &SourceGroup) -> usize {
        self.inner.lock().terminate_group(group)
    }

    /// Current mutation counter.
    pub fn revision(&self) -> u64 {
        self.inner.lock().revision()
    }
}
