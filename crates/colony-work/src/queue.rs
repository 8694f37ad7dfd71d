//! Task queues: production sites that work through a list of orders.
//!
//! A plain task evicts its crew on every completion. A queue instead swaps
//! in the next [`WorkOrder`] and keeps the same crew working, so a cook
//! moves straight from the stew to the bread. Only when the last order is
//! done does the queue fall back to plain completion (evict, notify,
//! remember the lead worker).
//!
//! Orders are validated on the way in; a malformed order is rejected and
//! logged, never loaded.

use std::collections::VecDeque;

use tracing::{info, warn};

use colony_types::{EvictionReason, QueueSnapshot, TaskId, TaskSnapshot, WorkOrder, WorkerId};
use colony_world::{PowerGrid, ResourceLedger};

use crate::error::WorkError;
use crate::observer::WorkObserver;
use crate::task::{Advance, Task, TaskContext, TaskSpec, TickOutcome};
use crate::worker::WorkerRoster;

/// A repeatable task driven by a FIFO of work orders.
///
/// `current == None` implies `pending` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQueue {
    task: Task,
    current: Option<WorkOrder>,
    pending: VecDeque<WorkOrder>,
}

impl TaskQueue {
    /// Create an empty queue. The `TaskSpec` duration and cost are placeholders
    /// until the first order loads; the policy is always repeat.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::InvalidTask`] if `spec` is invalid.
    pub fn new(spec: TaskSpec) -> Result<Self, WorkError> {
        let mut task = Task::new(spec)?;
        task.force_repeat();
        task.set_has_pending_work(false);
        Ok(Self {
            task,
            current: None,
            pending: VecDeque::new(),
        })
    }

    /// The underlying task.
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Identifier of the underlying task.
    pub const fn id(&self) -> TaskId {
        self.task.id()
    }

    /// The order currently being worked.
    pub const fn current(&self) -> Option<&WorkOrder> {
        self.current.as_ref()
    }

    /// Orders waiting behind the current one.
    pub fn pending(&self) -> impl Iterator<Item = &WorkOrder> {
        self.pending.iter()
    }

    /// Total orders, current included.
    pub fn len(&self) -> usize {
        self.pending
            .len()
            .saturating_add(usize::from(self.current.is_some()))
    }

    /// Whether there is nothing left to do.
    pub const fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Append an order.
    ///
    /// An empty queue loads it immediately. If no one is working the queue
    /// and a previous worker is remembered and idle, that worker is pulled
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::InvalidPayload`] for an order without a label,
    /// without a positive duration, or with a zero-quantity cost.
    pub fn enqueue(&mut self, order: WorkOrder, ctx: &mut TaskContext<'_>) -> Result<(), WorkError> {
        let duration = validate_order(self.task.id(), &order).inspect_err(|err| {
            warn!(task = %self.task.id(), label = %order.label, %err, "Rejected work order");
        })?;
        if self.current.is_none() {
            self.load(order, duration);
        } else {
            self.pending.push_back(order);
        }
        if self.task.bound_workers().is_empty() {
            self.task.try_reinstate(ctx);
        }
        Ok(())
    }

    fn load(&mut self, order: WorkOrder, duration: f64) {
        self.task.reconfigure(&order.label, duration, &order.cost);
        self.task.set_has_pending_work(true);
        self.current = Some(order);
    }

    /// Bind a worker to the current order.
    ///
    /// # Errors
    ///
    /// See [`Task::bind`]; an empty queue reports [`WorkError::NoWork`].
    pub fn bind(&mut self, worker: WorkerId, ctx: &mut TaskContext<'_>) -> Result<(), WorkError> {
        self.task.bind(worker, ctx)
    }

    /// Remove a worker without notification.
    ///
    /// # Errors
    ///
    /// See [`Task::unbind`].
    pub fn unbind(&mut self, worker: WorkerId, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        self.task.unbind(worker, workers)
    }

    /// Suspend or resume. See [`Task::set_operational`].
    pub fn set_operational(&mut self, operational: bool, ctx: &mut TaskContext<'_>) -> Option<WorkerId> {
        self.task.set_operational(operational, ctx)
    }

    /// See [`Task::can_start`].
    pub fn can_start(&self, power: &dyn PowerGrid) -> bool {
        self.task.can_start(power)
    }

    /// See [`Task::has_resources`].
    pub fn has_resources(&self, stock: &dyn ResourceLedger) -> bool {
        self.task.has_resources(stock)
    }

    /// Evict every bound worker.
    pub fn evict_all(
        &mut self,
        reason: EvictionReason,
        workers: &mut WorkerRoster,
        observer: &mut dyn WorkObserver,
    ) -> usize {
        self.task.evict_all(reason, workers, observer)
    }

    /// Advance the current order. On finishing it, either load the next
    /// order with the crew still bound or, if none remain, complete.
    pub fn tick(&mut self, dt: f64, ctx: &mut TaskContext<'_>) -> TickOutcome {
        match self.task.advance(dt, ctx) {
            Advance::Finished => {
                self.finish_order(ctx);
                TickOutcome::Completed
            }
            other => other.into(),
        }
    }

    fn finish_order(&mut self, ctx: &mut TaskContext<'_>) {
        let id = self.task.id();
        let done = self.current.take();
        let Some(next) = self.pending.pop_front() else {
            self.task.set_has_pending_work(false);
            self.task.complete(ctx);
            return;
        };

        if let Some(lead) = self.task.bound_workers().first().copied() {
            ctx.memory.remember(id, lead);
        }
        info!(
            task = %id,
            finished = done.as_ref().map_or("", |o| o.label.as_str()),
            next = %next.label,
            remaining = self.pending.len(),
            "Order completed, continuing with next"
        );
        ctx.observer.on_task_completed(id);

        let duration = next.duration.unwrap_or(self.task.duration());
        self.load(next, duration);
        if let Err(err) = self.task.pay_cost(ctx.stock) {
            warn!(task = %id, %err, "Next order cannot start, releasing crew");
            self.task
                .evict_all(EvictionReason::InsufficientResources, ctx.workers, ctx.observer);
        }
    }

    /// Persisted order state.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current.clone(),
            pending: self.pending.iter().cloned().collect(),
        }
    }

    /// Restore orders and task state from a save. Invalid orders are
    /// skipped; an invalid current order is replaced by the next valid one.
    /// Returns how many orders were skipped.
    ///
    /// # Errors
    ///
    /// See [`Task::restore`]. Orders are restored before the task state, so
    /// on error the queue holds the saved orders with no crew.
    pub fn restore(
        &mut self,
        queue: QueueSnapshot,
        task: TaskSnapshot,
        workers: &mut WorkerRoster,
    ) -> Result<usize, WorkError> {
        let id = self.task.id();
        let mut skipped = 0_usize;
        let mut valid = queue
            .current
            .into_iter()
            .chain(queue.pending)
            .filter_map(|order| match validate_order(id, &order) {
                Ok(duration) => Some((order, duration)),
                Err(err) => {
                    warn!(task = %id, %err, "Skipping saved work order");
                    skipped = skipped.saturating_add(1);
                    None
                }
            })
            .collect::<VecDeque<_>>();

        self.current = None;
        self.pending.clear();
        self.task.set_has_pending_work(false);
        if let Some((order, duration)) = valid.pop_front() {
            self.load(order, duration);
            self.pending = valid.into_iter().map(|(order, _)| order).collect();
        }
        self.task.restore(task, workers)?;
        Ok(skipped)
    }
}

/// Check an order and return its duration.
fn validate_order(task: TaskId, order: &WorkOrder) -> Result<f64, WorkError> {
    let invalid = |reason: &str| WorkError::InvalidPayload {
        task,
        reason: reason.to_owned(),
    };
    if order.label.trim().is_empty() {
        return Err(invalid("missing label"));
    }
    let duration = order.duration.ok_or_else(|| invalid("missing duration"))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(invalid("duration must be positive"));
    }
    if order.cost.iter().any(|c| c.quantity == 0) {
        return Err(invalid("zero-quantity cost"));
    }
    Ok(duration)
}
