// Run gate - tracks whether a model built from the session is executing

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts active runs; editing is refused while the count is non-zero
#[derive(Debug, Default)]
pub struct RunTracker {
    active: AtomicUsize,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    pub fn active_runs(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Mark a run as started; the returned guard ends it when dropped
    pub fn start(self: &Arc<Self>, name: impl Into<String>) -> ActiveRun {
        self.active.fetch_add(1, Ordering::AcqRel);
        let name = name.into();
        tracing::info!("run '{}' started, editing is locked", name);
        ActiveRun {
            tracker: Arc::clone(self),
            name,
        }
    }
}

/// RAII guard for one executing run
#[derive(Debug)]
pub struct ActiveRun {
    tracker: Arc<RunTracker>,
    name: String,
}

impl ActiveRun {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::AcqRel);
        tracing::info!("run '{}' finished", self.name);
    }
}
