//! Work scheduling and task lifecycle for the Colony simulation.
//!
//! Turns physical sites into schedulable units of work, matches idle
//! workers to them, combines the effort of several workers on one task, and
//! handles power starvation and resumption. Everything runs on one thread
//! inside the settlement's tick; collaborators are passed in per call.
//!
//! # Modules
//!
//! - [`task`] -- The task state machine and its per-call [`TaskContext`]
//! - [`queue`] -- Production tasks driven by a FIFO of work orders
//! - [`composite`] -- Manager tasks with one active child
//! - [`work`] -- The [`Work`] enum the scheduler stores
//! - [`scheduler`] -- Registry, FIFO matching, and previous-worker memory
//! - [`aggregate`] -- Diminishing-returns crew speed
//! - [`worker`] -- Worker records and the roster
//! - [`memory`] -- `task -> last worker` map
//! - [`observer`] -- Assignment, eviction, and completion notifications
//! - [`error`] -- Error types for this crate

pub mod aggregate;
pub mod composite;
pub mod error;
pub mod memory;
pub mod observer;
pub mod queue;
pub mod scheduler;
pub mod task;
pub mod work;
pub mod worker;

pub use aggregate::{aggregate_speed, crew_speed};
pub use composite::CompositeTask;
pub use error::WorkError;
pub use memory::AssignmentMemory;
pub use observer::{EventLog, NullObserver, WorkEvent, WorkObserver};
pub use queue::TaskQueue;
pub use scheduler::{Scheduler, TickReport, WorkEnv};
pub use task::{CompletionPolicy, PROGRESS_EPSILON, Task, TaskContext, TaskSpec, TickOutcome};
pub use work::Work;
pub use worker::{WorkerRoster, WorkerState};
