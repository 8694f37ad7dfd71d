//! Work observer that logs notifications and tracks released workers.
//!
//! The scheduler cannot be re-entered from inside a notification, so
//! workers that lose their task are collected here and sent back to the
//! scheduler by the run loop once the triggering call has returned.

use colony_types::{EvictionReason, TaskId, WorkerId};
use colony_work::WorkObserver;
use tracing::{debug, info, warn};

/// Observer for the demo run loop.
#[derive(Debug, Default)]
pub struct LoggingObserver {
    released: Vec<WorkerId>,
    completions: u64,
}

impl LoggingObserver {
    /// Create an observer with nothing recorded.
    pub const fn new() -> Self {
        Self {
            released: Vec::new(),
            completions: 0,
        }
    }

    /// Take the workers evicted since the last call, oldest first.
    pub fn take_released(&mut self) -> Vec<WorkerId> {
        std::mem::take(&mut self.released)
    }

    /// Units of work finished so far.
    pub const fn completions(&self) -> u64 {
        self.completions
    }
}

impl WorkObserver for LoggingObserver {
    fn on_assigned(&mut self, worker: WorkerId, task: TaskId) {
        debug!(worker = %worker, task = %task, "Worker assigned");
    }

    fn on_evicted(&mut self, worker: WorkerId, task: TaskId, reason: EvictionReason) {
        match reason {
            EvictionReason::PowerStarved | EvictionReason::InsufficientResources => {
                warn!(worker = %worker, task = %task, reason = ?reason, "Worker evicted");
            }
            _ => debug!(worker = %worker, task = %task, reason = ?reason, "Worker evicted"),
        }
        self.released.push(worker);
    }

    fn on_task_available(&mut self, task: TaskId) {
        debug!(task = %task, "Task open for assignment");
    }

    fn on_task_completed(&mut self, task: TaskId) {
        self.completions = self.completions.saturating_add(1);
        info!(task = %task, "Task completed");
    }
}
