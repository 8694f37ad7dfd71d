//! Workers and the roster that holds them.
//!
//! A worker is a capability, not an owner: it contributes a speed multiplier
//! and remembers which task it is bound to so eviction callbacks can find it.
//! The task owns the binding list; the roster's `bound_task` field is only a
//! lookup kept in sync by the task.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colony_types::{TaskId, WorkerId};

use crate::error::WorkError;

/// Mutable state of one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerState {
    /// Stable identifier.
    pub id: WorkerId,
    /// Display name used in logs.
    pub name: String,
    /// Work-speed multiplier. `0` means currently incapable (starving,
    /// injured, asleep on their feet).
    speed: f64,
    /// The task this worker is bound to, if any.
    bound_task: Option<TaskId>,
}

impl WorkerState {
    /// Create an unbound worker.
    pub fn new(name: &str, speed: f64) -> Self {
        Self {
            id: WorkerId::new(),
            name: name.to_owned(),
            speed: sanitize_speed(speed),
            bound_task: None,
        }
    }

    /// Current speed multiplier (never negative).
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// The task this worker is bound to.
    pub const fn bound_task(&self) -> Option<TaskId> {
        self.bound_task
    }
}

/// Negative and non-finite speeds are stored as zero.
fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() { speed.max(0.0) } else { 0.0 }
}

/// Arena of all workers in the settlement, keyed by [`WorkerId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerRoster {
    workers: BTreeMap<WorkerId, WorkerState>,
}

impl WorkerRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            workers: BTreeMap::new(),
        }
    }

    /// Add a new unbound worker and return its id.
    pub fn spawn(&mut self, name: &str, speed: f64) -> WorkerId {
        let state = WorkerState::new(name, speed);
        let id = state.id;
        self.workers.insert(id, state);
        id
    }

    /// Insert an existing worker record (e.g. loaded from a save file).
    ///
    /// The binding is cleared; tasks re-establish bindings on restore.
    pub fn insert(&mut self, mut state: WorkerState) {
        state.bound_task = None;
        state.speed = sanitize_speed(state.speed);
        self.workers.insert(state.id, state);
    }

    /// Remove a worker from the roster.
    ///
    /// Callers must unbind the worker from its task first; the scheduler's
    /// `dismiss_worker` does both.
    pub fn remove(&mut self, worker: WorkerId) -> Option<WorkerState> {
        self.workers.remove(&worker)
    }

    /// Look up a worker.
    pub fn get(&self, worker: WorkerId) -> Option<&WorkerState> {
        self.workers.get(&worker)
    }

    /// Whether the worker is on the roster.
    pub fn contains(&self, worker: WorkerId) -> bool {
        self.workers.contains_key(&worker)
    }

    /// The worker's speed multiplier.
    pub fn speed(&self, worker: WorkerId) -> Option<f64> {
        self.workers.get(&worker).map(WorkerState::speed)
    }

    /// Update a worker's speed (hunger, injuries, buffs).
    ///
    /// The change takes effect on the bound task's next tick.
    pub fn set_speed(&mut self, worker: WorkerId, speed: f64) -> Result<(), WorkError> {
        let state = self
            .workers
            .get_mut(&worker)
            .ok_or(WorkError::WorkerNotFound(worker))?;
        state.speed = sanitize_speed(speed);
        Ok(())
    }

    /// The task the worker is bound to.
    pub fn bound_task(&self, worker: WorkerId) -> Option<TaskId> {
        self.workers.get(&worker).and_then(WorkerState::bound_task)
    }

    /// Whether the worker exists and is not bound to any task.
    pub fn is_idle(&self, worker: WorkerId) -> bool {
        self.workers
            .get(&worker)
            .is_some_and(|w| w.bound_task.is_none())
    }

    /// All unbound workers, in id order.
    pub fn idle_workers(&self) -> Vec<WorkerId> {
        self.workers
            .values()
            .filter(|w| w.bound_task.is_none())
            .map(|w| w.id)
            .collect()
    }

    /// Number of workers on the roster.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Iterate over all workers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkerState> {
        self.workers.values()
    }

    /// Record or clear a worker's binding. Only tasks call this.
    pub(crate) fn set_binding(&mut self, worker: WorkerId, task: Option<TaskId>) {
        if let Some(state) = self.workers.get_mut(&worker) {
            state.bound_task = task;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spawned_worker_is_idle() {
        let mut roster = WorkerRoster::new();
        let id = roster.spawn("Ada", 1.0);
        assert!(roster.is_idle(id));
        assert_eq!(roster.idle_workers(), vec![id]);
    }

    #[test]
    fn negative_speed_is_stored_as_zero() {
        let mut roster = WorkerRoster::new();
        let id = roster.spawn("Bo", -3.0);
        assert_eq!(roster.speed(id).map(f64::to_bits), Some(0.0_f64.to_bits()));
        roster.set_speed(id, f64::INFINITY).unwrap();
        assert_eq!(roster.speed(id).map(f64::to_bits), Some(0.0_f64.to_bits()));
    }

    #[test]
    fn binding_makes_worker_busy() {
        let mut roster = WorkerRoster::new();
        let id = roster.spawn("Cy", 1.0);
        let task = TaskId::new();
        roster.set_binding(id, Some(task));
        assert!(!roster.is_idle(id));
        assert_eq!(roster.bound_task(id), Some(task));
        assert!(roster.idle_workers().is_empty());
    }

    #[test]
    fn set_speed_on_unknown_worker_fails() {
        let mut roster = WorkerRoster::new();
        let ghost = WorkerId::new();
        assert_eq!(
            roster.set_speed(ghost, 1.0),
            Err(WorkError::WorkerNotFound(ghost))
        );
    }

    #[test]
    fn insert_clears_stale_binding() {
        let mut roster = WorkerRoster::new();
        let mut state = WorkerState::new("Dee", 1.0);
        state.bound_task = Some(TaskId::new());
        let id = state.id;
        roster.insert(state);
        assert!(roster.is_idle(id));
    }

    #[test]
    fn unknown_worker_is_not_idle() {
        let roster = WorkerRoster::new();
        assert!(!roster.is_idle(WorkerId::new()));
    }
}
