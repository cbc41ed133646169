//! Progress reporting and cooperative cancellation

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Progress sink for long-running catalog work.
///
/// Long loops check `is_cancelled` at every iteration and return what they
/// have collected so far once it flips.
pub trait ProgressMonitor: Send + Sync {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn begin_task(&self, _name: &str, _total_work: u64) {}

    fn subtask(&self, _name: &str) {}

    fn worked(&self, _amount: u64) {}

    fn done(&self) {}
}

/// Monitor that reports nothing and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressMonitor;

impl ProgressMonitor for NullProgressMonitor {}

/// Handle for cancelling work from any thread.
///
/// Safe to call repeatedly; later calls are no-ops.
pub trait CancelHandle: Send + Sync {
    fn cancel(&self);
}

#[derive(Debug, Default)]
struct MonitorState {
    cancelled: AtomicBool,
    worked: AtomicU64,
    task: Mutex<Option<String>>,
    subtask: Mutex<Option<String>>,
}

/// Monitor backed by a shared cancellation flag.
///
/// Clones share state, so one clone can be handed to a worker while another
/// cancels it.
#[derive(Debug, Clone, Default)]
pub struct CancellationMonitor {
    state: Arc<MonitorState>,
}

impl CancellationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("progress monitor cancelled");
        }
    }

    /// Total work units reported so far
    pub fn work_done(&self) -> u64 {
        self.state.worked.load(Ordering::Relaxed)
    }

    pub fn current_task(&self) -> Option<String> {
        self.state.task.lock().clone()
    }

    pub fn current_subtask(&self) -> Option<String> {
        self.state.subtask.lock().clone()
    }

    pub fn handle(&self) -> Arc<dyn CancelHandle> {
        Arc::new(self.clone())
    }
}

impl CancelHandle for CancellationMonitor {
    fn cancel(&self) {
        CancellationMonitor::cancel(self);
    }
}

impl ProgressMonitor for CancellationMonitor {
    fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    fn begin_task(&self, name: &str, total_work: u64) {
        tracing::trace!(task = %name, total_work, "task started");
        *self.state.task.lock() = Some(name.to_string());
    }

    fn subtask(&self, name: &str) {
        *self.state.subtask.lock() = Some(name.to_string());
    }

    fn worked(&self, amount: u64) {
        self.state.worked.fetch_add(amount, Ordering::Relaxed);
    }

    fn done(&self) {
        *self.state.subtask.lock() = None;
    }
}
