//! Error types for the `colony-work` crate.
//!
//! Gating failures (capacity, resources, suspension) are ordinary runtime
//! conditions: the caller receives them as values and tries something else.
//! Precondition violations (double bind, unbinding a stranger) are rejected
//! the same way and logged at `warn` level; the scheduler never panics and
//! never corrupts its binding state.

use colony_types::{Resource, TaskId, WorkerId};

/// Errors that can occur during task and scheduler operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkError {
    /// Bind attempted on a task already at capacity.
    #[error("task {task} is full ({capacity} workers)")]
    TaskFull {
        /// The full task.
        task: TaskId,
        /// Its capacity.
        capacity: u32,
    },

    /// The worker is already bound to a task and must be unbound first.
    #[error("worker {worker} is already bound to task {task}")]
    AlreadyBound {
        /// The worker.
        worker: WorkerId,
        /// The task it is currently bound to.
        task: TaskId,
    },

    /// Unbind attempted for a worker that is not bound to this task.
    #[error("worker {worker} is not bound to task {task}")]
    NotBound {
        /// The worker.
        worker: WorkerId,
        /// The task the caller named.
        task: TaskId,
    },

    /// The stockpile cannot pay the task's resource cost.
    #[error("task {task} needs {required} {resource:?} to start")]
    InsufficientResources {
        /// The task that could not start.
        task: TaskId,
        /// The first resource that was short.
        resource: Resource,
        /// Units of that resource the task requires.
        required: u32,
    },

    /// The task was suspended because the pool could not cover its draw,
    /// and has not been resumed since.
    #[error("task {task} is starved of power")]
    PowerStarved {
        /// The starved task.
        task: TaskId,
    },

    /// A queued work order is missing required fields.
    #[error("invalid work order for task {task}: {reason}")]
    InvalidPayload {
        /// The queue task the order was meant for.
        task: TaskId,
        /// What was wrong with the order.
        reason: String,
    },

    /// The task is administratively suspended.
    #[error("task {0} is not operational")]
    NotOperational(TaskId),

    /// The task has nothing left to do (finished one-shot or empty queue).
    #[error("task {0} has no work available")]
    NoWork(TaskId),

    /// No task with this id is registered.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// No worker with this id is on the roster.
    #[error("worker not found: {0}")]
    WorkerNotFound(WorkerId),

    /// The task exists but is not a composite site.
    #[error("task {0} is not a composite task")]
    NotComposite(TaskId),

    /// The task exists but is not a task queue.
    #[error("task {0} is not a task queue")]
    NotQueue(TaskId),

    /// A task was constructed with invalid parameters.
    #[error("invalid task definition: {reason}")]
    InvalidTask {
        /// Description of the invalid parameter.
        reason: String,
    },
}
