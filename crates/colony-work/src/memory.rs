//! Previous-occupant memory.
//!
//! Maps each task to the last worker that served it so the task can pull
//! that worker back after a suspend/resume cycle or between queued
//! payloads. Entries are lookups only; a remembered worker may since have
//! been bound elsewhere or dismissed, and callers check before re-binding.

use std::collections::BTreeMap;

use colony_types::{TaskId, WorkerId};

/// `task -> last worker` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentMemory {
    last_worker_of: BTreeMap<TaskId, WorkerId>,
}

impl AssignmentMemory {
    /// Create an empty memory.
    pub const fn new() -> Self {
        Self {
            last_worker_of: BTreeMap::new(),
        }
    }

    /// Record `worker` as the last occupant of `task`, replacing any earlier
    /// entry.
    pub fn remember(&mut self, task: TaskId, worker: WorkerId) {
        self.last_worker_of.insert(task, worker);
    }

    /// The last worker recorded for `task`.
    pub fn recall(&self, task: TaskId) -> Option<WorkerId> {
        self.last_worker_of.get(&task).copied()
    }

    /// Drop the entry for `task`.
    pub fn forget(&mut self, task: TaskId) -> Option<WorkerId> {
        self.last_worker_of.remove(&task)
    }

    /// Drop every entry naming `worker`.
    pub fn forget_worker(&mut self, worker: WorkerId) {
        self.last_worker_of.retain(|_, w| *w != worker);
    }

    /// Number of remembered tasks.
    pub fn len(&self) -> usize {
        self.last_worker_of.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.last_worker_of.is_empty()
    }
}
