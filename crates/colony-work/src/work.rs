//! The three shapes of schedulable work, behind one enum.
//!
//! The scheduler stores [`Work`] values and dispatches every lifecycle call
//! through here, so it never needs to know whether a site is a plain task,
//! a production queue, or a manager with sub-jobs.

use colony_types::{EvictionReason, TaskId, TaskPhase, WorkerId};
use colony_world::{PowerGrid, ResourceLedger};

use crate::composite::CompositeTask;
use crate::error::WorkError;
use crate::observer::WorkObserver;
use crate::queue::TaskQueue;
use crate::task::{CompletionPolicy, Task, TaskContext, TickOutcome};
use crate::worker::WorkerRoster;

/// A registered unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Work {
    /// A plain task.
    Single(Task),
    /// A task driven by a queue of work orders.
    Queue(TaskQueue),
    /// A manager task with an optional active child.
    Composite(CompositeTask),
}

impl Work {
    /// The registered identifier.
    pub const fn id(&self) -> TaskId {
        match self {
            Self::Single(task) => task.id(),
            Self::Queue(queue) => queue.id(),
            Self::Composite(composite) => composite.id(),
        }
    }

    /// The task that currently receives lifecycle calls.
    pub fn task(&self) -> &Task {
        match self {
            Self::Single(task) => task,
            Self::Queue(queue) => queue.task(),
            Self::Composite(composite) => composite.target(),
        }
    }

    /// Whether `task` is this work or one of its parts.
    pub fn owns(&self, task: TaskId) -> bool {
        match self {
            Self::Composite(composite) => composite.owns(task),
            other => other.id() == task,
        }
    }

    /// Bind a worker. See [`Task::bind`].
    ///
    /// # Errors
    ///
    /// See [`Task::bind`].
    pub fn bind(&mut self, worker: WorkerId, ctx: &mut TaskContext<'_>) -> Result<(), WorkError> {
        match self {
            Self::Single(task) => task.bind(worker, ctx),
            Self::Queue(queue) => queue.bind(worker, ctx),
            Self::Composite(composite) => composite.bind(worker, ctx),
        }
    }

    /// Unbind a worker. See [`Task::unbind`].
    ///
    /// # Errors
    ///
    /// See [`Task::unbind`].
    pub fn unbind(&mut self, worker: WorkerId, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        match self {
            Self::Single(task) => task.unbind(worker, workers),
            Self::Queue(queue) => queue.unbind(worker, workers),
            Self::Composite(composite) => composite.unbind(worker, workers),
        }
    }

    /// Advance by `dt`.
    pub fn tick(&mut self, dt: f64, ctx: &mut TaskContext<'_>) -> TickOutcome {
        match self {
            Self::Single(task) => task.tick(dt, ctx),
            Self::Queue(queue) => queue.tick(dt, ctx),
            Self::Composite(composite) => composite.tick(dt, ctx),
        }
    }

    /// Suspend or resume.
    pub fn set_operational(&mut self, operational: bool, ctx: &mut TaskContext<'_>) -> Option<WorkerId> {
        match self {
            Self::Single(task) => task.set_operational(operational, ctx),
            Self::Queue(queue) => queue.set_operational(operational, ctx),
            Self::Composite(composite) => composite.set_operational(operational, ctx),
        }
    }

    /// Evict every worker on this work.
    pub fn evict_all(
        &mut self,
        reason: EvictionReason,
        workers: &mut WorkerRoster,
        observer: &mut dyn WorkObserver,
    ) -> usize {
        match self {
            Self::Single(task) => task.evict_all(reason, workers, observer),
            Self::Queue(queue) => queue.evict_all(reason, workers, observer),
            Self::Composite(composite) => composite.evict_all(reason, workers, observer),
        }
    }

    /// See [`Task::can_start`].
    pub fn can_start(&self, power: &dyn PowerGrid) -> bool {
        match self {
            Self::Single(task) => task.can_start(power),
            Self::Queue(queue) => queue.can_start(power),
            Self::Composite(composite) => composite.can_start(power),
        }
    }

    /// See [`Task::has_resources`].
    pub fn has_resources(&self, stock: &dyn ResourceLedger) -> bool {
        match self {
            Self::Single(task) => task.has_resources(stock),
            Self::Queue(queue) => queue.has_resources(stock),
            Self::Composite(composite) => composite.has_resources(stock),
        }
    }

    /// Whether no further worker can bind right now.
    pub fn is_full(&self) -> bool {
        self.task().is_full()
    }

    /// Derived phase of the current task.
    pub fn phase(&self) -> TaskPhase {
        self.task().phase()
    }

    /// Workers bound to the current task.
    pub fn bound_workers(&self) -> &[WorkerId] {
        self.task().bound_workers()
    }

    /// Progress bar text.
    pub fn tooltip(&self) -> String {
        self.task().tooltip()
    }

    /// Whether this is a finished one-shot that its owner should reclaim.
    pub fn is_reclaimable(&self) -> bool {
        matches!(self, Self::Single(task)
            if task.policy() == CompletionPolicy::OneShot && task.is_finished())
    }

    /// Ids of every task inside this work (composite children included).
    pub fn task_ids(&self) -> Vec<TaskId> {
        match self {
            Self::Composite(composite) => std::iter::once(composite.id())
                .chain(composite.child().map(Task::id))
                .collect(),
            other => vec![other.id()],
        }
    }
}

impl From<Task> for Work {
    fn from(task: Task) -> Self {
        Self::Single(task)
    }
}

impl From<TaskQueue> for Work {
    fn from(queue: TaskQueue) -> Self {
        Self::Queue(queue)
    }
}

impl From<CompositeTask> for Work {
    fn from(composite: CompositeTask) -> Self {
        Self::Composite(composite)
    }
}
