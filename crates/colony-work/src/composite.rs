//! Composite tasks: manager sites whose concrete activity changes over time.
//!
//! A cleaning station spawns a dirt-removal job, the worker scrubs it, the
//! job retires, and the station spawns the next one. The station itself is
//! the registered task; the current job is its active child. While a child
//! exists every lifecycle call goes to the child, otherwise to the station's
//! own base task.

use tracing::{debug, info};

use colony_types::{EvictionReason, TaskId, TaskPhase, TaskSnapshot, WorkerId};
use colony_world::{PowerGrid, ResourceLedger};

use crate::error::WorkError;
use crate::memory::AssignmentMemory;
use crate::observer::WorkObserver;
use crate::task::{Task, TaskContext, TaskSpec, TickOutcome};
use crate::worker::WorkerRoster;

/// A base task plus at most one owned child task.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeTask {
    base: Task,
    child: Option<Task>,
}

impl CompositeTask {
    /// Create a composite with no active child.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::InvalidTask`] if the base spec is invalid.
    pub fn new(spec: TaskSpec) -> Result<Self, WorkError> {
        Ok(Self {
            base: Task::new(spec)?,
            child: None,
        })
    }

    /// Identifier of the composite (its base task).
    pub const fn id(&self) -> TaskId {
        self.base.id()
    }

    /// The base task.
    pub const fn base(&self) -> &Task {
        &self.base
    }

    /// The active child, if any.
    pub const fn child(&self) -> Option<&Task> {
        self.child.as_ref()
    }

    /// The task that currently receives forwarded calls.
    pub fn target(&self) -> &Task {
        self.child.as_ref().unwrap_or(&self.base)
    }

    fn target_mut(&mut self) -> &mut Task {
        self.child.as_mut().unwrap_or(&mut self.base)
    }

    /// Whether `task` is the composite or its active child.
    pub fn owns(&self, task: TaskId) -> bool {
        self.base.id() == task || self.child.as_ref().is_some_and(|c| c.id() == task)
    }

    /// Replace the active child.
    ///
    /// The old child's crew is evicted with [`EvictionReason::Replaced`] and
    /// its memory entry dropped. If `worker` is working the base task it is
    /// moved over and the rest of the base crew is evicted with
    /// [`EvictionReason::Replaced`]; then `worker` is bound to the new child.
    ///
    /// # Errors
    ///
    /// Any bind error for `worker` (see [`Task::bind`]). The new child is
    /// installed even if that bind fails.
    pub fn set_active_child(
        &mut self,
        child: Task,
        worker: Option<WorkerId>,
        ctx: &mut TaskContext<'_>,
    ) -> Result<(), WorkError> {
        if let Some(mut old) = self.child.take() {
            old.evict_all(EvictionReason::Replaced, ctx.workers, ctx.observer);
            ctx.memory.forget(old.id());
            debug!(composite = %self.base.id(), retired = %old.id(), "Active child replaced");
        }
        if let Some(w) = worker
            && self.base.bound_workers().contains(&w)
        {
            self.base.unbind(w, ctx.workers)?;
        }
        self.base.evict_all(EvictionReason::Replaced, ctx.workers, ctx.observer);

        info!(
            composite = %self.base.id(),
            child = %child.id(),
            label = %child.label(),
            "Active child installed"
        );
        let installed = self.child.insert(child);
        match worker {
            Some(w) => installed.bind(w, ctx),
            None => Ok(()),
        }
    }

    /// Clear the active child after it completed and hand it back to the
    /// owner. The child's last worker is remembered under the composite so
    /// the owner can pass it to the next child.
    pub fn on_child_completed(&mut self, memory: &mut AssignmentMemory) -> Option<Task> {
        let child = self.child.take()?;
        if let Some(worker) = memory.forget(child.id()) {
            memory.remember(self.base.id(), worker);
        }
        debug!(composite = %self.base.id(), child = %child.id(), "Active child cleared");
        Some(child)
    }

    /// See [`Task::bind`]; forwarded to the target.
    ///
    /// # Errors
    ///
    /// See [`Task::bind`].
    pub fn bind(&mut self, worker: WorkerId, ctx: &mut TaskContext<'_>) -> Result<(), WorkError> {
        self.target_mut().bind(worker, ctx)
    }

    /// Remove `worker` from whichever of base or child holds it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NotBound`] if neither does.
    pub fn unbind(&mut self, worker: WorkerId, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        if let Some(child) = self.child.as_mut()
            && child.bound_workers().contains(&worker)
        {
            return child.unbind(worker, workers);
        }
        self.base.unbind(worker, workers)
    }

    /// Tick the target. A completed child is cleared.
    pub fn tick(&mut self, dt: f64, ctx: &mut TaskContext<'_>) -> TickOutcome {
        let Some(child) = self.child.as_mut() else {
            return self.base.tick(dt, ctx);
        };
        let outcome = child.tick(dt, ctx);
        if outcome == TickOutcome::Completed {
            self.on_child_completed(ctx.memory);
        }
        outcome
    }

    /// Suspend or resume the base and the child together. On resume only the
    /// target pulls its remembered worker back.
    pub fn set_operational(&mut self, operational: bool, ctx: &mut TaskContext<'_>) -> Option<WorkerId> {
        match self.child.as_mut() {
            Some(child) => {
                self.base.switch_operational(operational, ctx);
                child.set_operational(operational, ctx)
            }
            None => self.base.set_operational(operational, ctx),
        }
    }

    /// See [`Task::can_start`]; forwarded to the target.
    pub fn can_start(&self, power: &dyn PowerGrid) -> bool {
        self.target().can_start(power)
    }

    /// See [`Task::has_resources`]; forwarded to the target.
    pub fn has_resources(&self, stock: &dyn ResourceLedger) -> bool {
        self.target().has_resources(stock)
    }

    /// Phase of the target.
    pub fn phase(&self) -> TaskPhase {
        self.target().phase()
    }

    /// Tooltip of the target.
    pub fn tooltip(&self) -> String {
        self.target().tooltip()
    }

    /// Restore the target from a save. See [`Task::restore`].
    ///
    /// # Errors
    ///
    /// See [`Task::restore`].
    pub fn restore(&mut self, snapshot: TaskSnapshot, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        self.target_mut().restore(snapshot, workers)
    }

    /// Evict the crews of both base and child.
    pub fn evict_all(
        &mut self,
        reason: EvictionReason,
        workers: &mut WorkerRoster,
        observer: &mut dyn WorkObserver,
    ) -> usize {
        let child = self
            .child
            .as_mut()
            .map_or(0, |c| c.evict_all(reason, workers, observer));
        child.saturating_add(self.base.evict_all(reason, workers, observer))
    }
}
