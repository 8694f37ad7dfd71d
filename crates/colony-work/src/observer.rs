//! Notification seam between the engine and its consumers.
//!
//! Character controllers implement the worker half (`on_assigned`,
//! `on_evicted`) to switch between working and idle behaviour; UI and
//! re-queue logic implement the listener half (`on_task_available`,
//! `on_task_completed`). Every notification is delivered synchronously,
//! before the call that caused it returns.

use colony_types::{EvictionReason, TaskId, WorkerId};

/// Receiver for worker and task lifecycle notifications.
///
/// All methods default to no-ops so implementors only override what they
/// care about.
pub trait WorkObserver {
    /// A worker was bound to a task.
    fn on_assigned(&mut self, _worker: WorkerId, _task: TaskId) {}

    /// A worker was removed from a task by the engine.
    ///
    /// Not fired for explicit `unbind` calls; the caller already knows.
    fn on_evicted(&mut self, _worker: WorkerId, _task: TaskId, _reason: EvictionReason) {}

    /// A task was registered and is open for assignment.
    fn on_task_available(&mut self, _task: TaskId) {}

    /// A task finished one unit of work (one cycle or one queued payload).
    fn on_task_completed(&mut self, _task: TaskId) {}
}

/// Observer that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl WorkObserver for NullObserver {}

/// A recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkEvent {
    /// See [`WorkObserver::on_assigned`].
    Assigned {
        /// The worker.
        worker: WorkerId,
        /// The task.
        task: TaskId,
    },
    /// See [`WorkObserver::on_evicted`].
    Evicted {
        /// The worker.
        worker: WorkerId,
        /// The task.
        task: TaskId,
        /// Why.
        reason: EvictionReason,
    },
    /// See [`WorkObserver::on_task_available`].
    Available(TaskId),
    /// See [`WorkObserver::on_task_completed`].
    Completed(TaskId),
}

/// Observer that records every notification in order.
///
/// Used by tests and by replay tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<WorkEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// All events in delivery order.
    pub fn events(&self) -> &[WorkEvent] {
        &self.events
    }

    /// Drop every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of completion notifications for `task`.
    pub fn completions_of(&self, task: TaskId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, WorkEvent::Completed(t) if *t == task))
            .count()
    }

    /// Eviction reasons delivered to `worker`, in order.
    pub fn evictions_of(&self, worker: WorkerId) -> Vec<EvictionReason> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                WorkEvent::Evicted { worker: w, reason, .. } if w == worker => Some(reason),
                _ => None,
            })
            .collect()
    }

    /// Number of assignment notifications for `worker`.
    pub fn assignments_of(&self, worker: WorkerId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, WorkEvent::Assigned { worker: w, .. } if *w == worker))
            .count()
    }
}

impl WorkObserver for EventLog {
    fn on_assigned(&mut self, worker: WorkerId, task: TaskId) {
        self.events.push(WorkEvent::Assigned { worker, task });
    }

    fn on_evicted(&mut self, worker: WorkerId, task: TaskId, reason: EvictionReason) {
        self.events.push(WorkEvent::Evicted {
            worker,
            task,
            reason,
        });
    }

    fn on_task_available(&mut self, task: TaskId) {
        self.events.push(WorkEvent::Available(task));
    }

    fn on_task_completed(&mut self, task: TaskId) {
        self.events.push(WorkEvent::Completed(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_filters_by_subject() {
        let mut log = EventLog::new();
        let (a, b) = (WorkerId::new(), WorkerId::new());
        let task = TaskId::new();
        log.on_assigned(a, task);
        log.on_evicted(a, task, EvictionReason::Completed);
        log.on_evicted(b, task, EvictionReason::PowerStarved);
        log.on_task_completed(task);

        assert_eq!(log.assignments_of(a), 1);
        assert_eq!(log.evictions_of(a), vec![EvictionReason::Completed]);
        assert_eq!(log.evictions_of(b), vec![EvictionReason::PowerStarved]);
        assert_eq!(log.completions_of(task), 1);
        assert_eq!(log.events().len(), 4);
    }

    #[test]
    fn null_observer_accepts_everything() {
        let mut observer = NullObserver;
        observer.on_task_available(TaskId::new());
        observer.on_task_completed(TaskId::new());
    }
}
