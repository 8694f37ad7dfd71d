//! The task state machine.
//!
//! A [`Task`] is one schedulable unit of work at a site. Its phase is never
//! stored; it is derived from the binding list, the operational flag, and
//! the one-shot finish flag:
//!
//! ```text
//!  Idle ──bind──▶ Active ──progress >= duration──▶ complete()
//!   ▲               │ │                               │      │
//!   │ unbind/0 speed│ │ power refused       repeat    │      │ one-shot
//!   └───────────────┘ ▼                               ▼      ▼
//!                  Suspended ──set_operational(true)─▶ Idle   Completed
//! ```
//!
//! Every collaborator a task touches during a call arrives through
//! [`TaskContext`]; tasks hold no references to the roster, the memory, the
//! power pool, or the stockpile between calls.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use colony_types::{
    EvictionReason, Resource, ResourceCost, SiteId, SiteKind, TaskId, TaskPhase, TaskSnapshot,
    WorkerId,
};
use colony_world::{PowerGrid, ResourceLedger};

use crate::aggregate::crew_speed;
use crate::error::WorkError;
use crate::memory::AssignmentMemory;
use crate::observer::WorkObserver;
use crate::worker::WorkerRoster;

/// Tolerance for the completion check so accumulated `dt` steps that sum to
/// the duration on paper also complete in floating point.
pub const PROGRESS_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// What happens after a task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// The task finishes for good and its owner reclaims it (construction).
    OneShot,
    /// The task resets to `Idle` and can be worked again (farms, beds).
    Repeat,
}

/// Construction parameters for a [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// The site that owns the task.
    pub site: SiteId,
    /// Kind of site, used for tooltips and logs.
    pub kind: SiteKind,
    /// Display label ("North Field").
    pub label: String,
    /// Maximum concurrent workers.
    pub capacity: u32,
    /// Work-seconds required at aggregate speed 1.0.
    pub duration: f64,
    /// Power units drawn per work-second.
    pub power_draw: f64,
    /// Resources consumed at the start of each cycle.
    pub cost: Vec<ResourceCost>,
    /// Completion behaviour.
    pub policy: CompletionPolicy,
}

impl TaskSpec {
    /// A repeatable single-worker task with no power draw and no cost.
    pub fn new(kind: SiteKind, label: &str, duration: f64) -> Self {
        Self {
            site: SiteId::new(),
            kind,
            label: label.to_owned(),
            capacity: 1,
            duration,
            power_draw: 0.0,
            cost: Vec::new(),
            policy: CompletionPolicy::Repeat,
        }
    }

    /// Attach the task to an existing site.
    #[must_use]
    pub const fn at_site(mut self, site: SiteId) -> Self {
        self.site = site;
        self
    }

    /// Set the worker capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the power draw per work-second.
    #[must_use]
    pub const fn with_power_draw(mut self, power_draw: f64) -> Self {
        self.power_draw = power_draw;
        self
    }

    /// Add a resource cost paid at the start of each cycle.
    #[must_use]
    pub fn with_cost(mut self, resource: Resource, quantity: u32) -> Self {
        self.cost.push(ResourceCost::new(resource, quantity));
        self
    }

    /// Make the task one-shot.
    #[must_use]
    pub const fn one_shot(mut self) -> Self {
        self.policy = CompletionPolicy::OneShot;
        self
    }
}

// ---------------------------------------------------------------------------
// Context and outcomes
// ---------------------------------------------------------------------------

/// Collaborators lent to a task for the duration of one call.
pub struct TaskContext<'a> {
    /// Worker speeds and bindings.
    pub workers: &'a mut WorkerRoster,
    /// Previous-occupant memory.
    pub memory: &'a mut AssignmentMemory,
    /// Shared power pool.
    pub power: &'a mut dyn PowerGrid,
    /// Shared resource stacks.
    pub stock: &'a mut dyn ResourceLedger,
    /// Notification sink.
    pub observer: &'a mut dyn WorkObserver,
}

/// What one call to `tick` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// No workers bound, not operational, or nothing to do.
    Idle,
    /// Progress advanced without completing.
    Progressed,
    /// A completion notification fired.
    Completed,
    /// Aggregate speed was zero; all workers were sent to rest.
    Exhausted,
    /// The power draw was refused; the task is now suspended.
    PowerStarved,
}

/// Result of advancing progress, before completion handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    Idle,
    Progressed,
    Finished,
    Exhausted,
    PowerStarved,
}

impl From<Advance> for TickOutcome {
    fn from(advance: Advance) -> Self {
        match advance {
            Advance::Idle => Self::Idle,
            Advance::Progressed => Self::Progressed,
            Advance::Finished => Self::Completed,
            Advance::Exhausted => Self::Exhausted,
            Advance::PowerStarved => Self::PowerStarved,
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A stateful unit of schedulable work bound to a site.
///
/// Invariants held by every method:
///
/// - `bound.len() <= capacity`
/// - `0 <= progress <= duration`
/// - not operational implies no bound workers
/// - power and resources are only consumed while at least one worker is bound
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    site: SiteId,
    kind: SiteKind,
    label: String,
    capacity: u32,
    bound: Vec<WorkerId>,
    progress: f64,
    duration: f64,
    power_draw: f64,
    resource_cost: Vec<ResourceCost>,
    /// Whether the current cycle's resource cost has been paid.
    cost_paid: bool,
    operational: bool,
    /// Set when the pool refused a draw; cleared on resume.
    starved: bool,
    policy: CompletionPolicy,
    /// Set once a one-shot task completes.
    finished: bool,
    /// Cleared by task queues when they run out of orders.
    has_pending_work: bool,
}

impl Task {
    /// Build a task from its spec.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::InvalidTask`] for a zero capacity, a
    /// non-positive or non-finite duration, or a negative power draw.
    pub fn new(spec: TaskSpec) -> Result<Self, WorkError> {
        if spec.capacity == 0 {
            return Err(WorkError::InvalidTask {
                reason: format!("{}: capacity must be at least 1", spec.label),
            });
        }
        if !spec.duration.is_finite() || spec.duration <= 0.0 {
            return Err(WorkError::InvalidTask {
                reason: format!("{}: duration must be positive, got {}", spec.label, spec.duration),
            });
        }
        if !spec.power_draw.is_finite() || spec.power_draw < 0.0 {
            return Err(WorkError::InvalidTask {
                reason: format!(
                    "{}: power draw must be non-negative, got {}",
                    spec.label, spec.power_draw
                ),
            });
        }
        Ok(Self {
            id: TaskId::new(),
            site: spec.site,
            kind: spec.kind,
            label: spec.label,
            capacity: spec.capacity,
            bound: Vec::new(),
            progress: 0.0,
            duration: spec.duration,
            power_draw: spec.power_draw,
            resource_cost: spec.cost,
            cost_paid: false,
            operational: true,
            starved: false,
            policy: spec.policy,
            finished: false,
            has_pending_work: true,
        })
    }

    // --- Accessors ---

    /// Stable identifier.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Owning site.
    pub const fn site(&self) -> SiteId {
        self.site
    }

    /// Kind of owning site.
    pub const fn kind(&self) -> SiteKind {
        self.kind
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Maximum concurrent workers.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bound workers in binding order.
    pub fn bound_workers(&self) -> &[WorkerId] {
        &self.bound
    }

    /// Elapsed work-seconds.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Work-seconds required.
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Power units drawn per work-second.
    pub const fn power_draw(&self) -> f64 {
        self.power_draw
    }

    /// Resources paid at the start of each cycle.
    pub fn resource_cost(&self) -> &[ResourceCost] {
        &self.resource_cost
    }

    /// Whether the task may progress.
    pub const fn is_operational(&self) -> bool {
        self.operational
    }

    /// Completion behaviour.
    pub const fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Whether a one-shot task has completed.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether there is anything left to do.
    pub const fn has_work(&self) -> bool {
        !self.finished && self.has_pending_work
    }

    /// Whether the current cycle's cost has already been paid.
    pub const fn is_cost_paid(&self) -> bool {
        self.cost_paid
    }

    /// Whether no further worker can bind.
    pub fn is_full(&self) -> bool {
        self.bound.len() >= self.capacity_usize()
    }

    /// Derived lifecycle phase.
    pub fn phase(&self) -> TaskPhase {
        if self.finished {
            TaskPhase::Completed
        } else if !self.operational {
            TaskPhase::Suspended
        } else if self.bound.is_empty() {
            TaskPhase::Idle
        } else {
            TaskPhase::Active
        }
    }

    /// Progress bar text, e.g. `"Farming: North Field (40%)"`.
    pub fn tooltip(&self) -> String {
        let pct = if self.duration > 0.0 {
            (self.progress / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        format!("{}: {} ({pct:.0}%)", self.kind.activity(), self.label)
    }

    fn capacity_usize(&self) -> usize {
        usize::try_from(self.capacity).unwrap_or(usize::MAX)
    }

    // --- Gating ---

    /// Whether the task could be started right now: operational, has work,
    /// and the pool can cover the power for the remaining work.
    pub fn can_start(&self, power: &dyn PowerGrid) -> bool {
        if !self.operational || !self.has_work() {
            return false;
        }
        if self.power_draw <= 0.0 {
            return true;
        }
        let remaining = (self.duration - self.progress).max(0.0);
        power.has_capacity(self.power_draw * remaining)
    }

    /// Whether the stockpile can pay the current cycle's cost (or it is
    /// already paid).
    pub fn has_resources(&self, stock: &dyn ResourceLedger) -> bool {
        self.cost_paid || stock.has_all(&self.resource_cost)
    }

    /// Pay the current cycle's cost in one check-and-consume.
    pub(crate) fn pay_cost(&mut self, stock: &mut dyn ResourceLedger) -> Result<(), WorkError> {
        if self.cost_paid || self.resource_cost.is_empty() || stock.consume_all(&self.resource_cost) {
            self.cost_paid = true;
            return Ok(());
        }
        let Some(short) = self
            .resource_cost
            .iter()
            .find(|c| !stock.has(c.resource, c.quantity))
            .or_else(|| self.resource_cost.first())
            .copied()
        else {
            self.cost_paid = true;
            return Ok(());
        };
        Err(WorkError::InsufficientResources {
            task: self.id,
            resource: short.resource,
            required: short.quantity,
        })
    }

    // --- Binding ---

    /// Bind an idle worker.
    ///
    /// The first worker of a cycle pays the resource cost. Nothing changes
    /// when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`WorkError::NoWork`] if a one-shot finished or a queue is empty
    /// - [`WorkError::PowerStarved`] while suspended for lack of power
    /// - [`WorkError::NotOperational`] while otherwise suspended
    /// - [`WorkError::WorkerNotFound`] for an unknown worker
    /// - [`WorkError::AlreadyBound`] if the worker is bound anywhere
    /// - [`WorkError::TaskFull`] at capacity
    /// - [`WorkError::InsufficientResources`] if the cost cannot be paid
    pub fn bind(&mut self, worker: WorkerId, ctx: &mut TaskContext<'_>) -> Result<(), WorkError> {
        if !self.has_work() {
            return Err(WorkError::NoWork(self.id));
        }
        if !self.operational {
            return Err(if self.starved {
                WorkError::PowerStarved { task: self.id }
            } else {
                WorkError::NotOperational(self.id)
            });
        }
        if !ctx.workers.contains(worker) {
            return Err(WorkError::WorkerNotFound(worker));
        }
        if let Some(current) = ctx.workers.bound_task(worker) {
            warn!(
                task = %self.id,
                worker = %worker,
                bound_to = %current,
                "Rejected bind: worker already bound"
            );
            return Err(WorkError::AlreadyBound {
                worker,
                task: current,
            });
        }
        if self.is_full() {
            return Err(WorkError::TaskFull {
                task: self.id,
                capacity: self.capacity,
            });
        }
        self.pay_cost(ctx.stock)?;

        self.bound.push(worker);
        ctx.workers.set_binding(worker, Some(self.id));
        debug!(
            task = %self.id,
            worker = %worker,
            crew = self.bound.len(),
            "Worker bound"
        );
        ctx.observer.on_assigned(worker, self.id);
        Ok(())
    }

    /// Remove a worker. Progress is kept; no eviction callback fires.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::NotBound`] if the worker is not bound here.
    pub fn unbind(&mut self, worker: WorkerId, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        if !self.bound.contains(&worker) {
            warn!(task = %self.id, worker = %worker, "Rejected unbind: worker not bound here");
            return Err(WorkError::NotBound {
                worker,
                task: self.id,
            });
        }
        self.bound.retain(|w| *w != worker);
        workers.set_binding(worker, None);
        debug!(
            task = %self.id,
            worker = %worker,
            crew = self.bound.len(),
            progress = self.progress,
            "Worker unbound"
        );
        Ok(())
    }

    /// Evict every bound worker, notifying each. Returns how many were
    /// evicted.
    pub fn evict_all(
        &mut self,
        reason: EvictionReason,
        workers: &mut WorkerRoster,
        observer: &mut dyn WorkObserver,
    ) -> usize {
        let evicted: Vec<WorkerId> = self.bound.drain(..).collect();
        for worker in &evicted {
            workers.set_binding(*worker, None);
            observer.on_evicted(*worker, self.id, reason);
        }
        if !evicted.is_empty() {
            debug!(task = %self.id, count = evicted.len(), ?reason, "Workers evicted");
        }
        evicted.len()
    }

    // --- Ticking ---

    /// Advance by `dt` simulated seconds. Completion handling is left to the
    /// caller so queues can substitute their own.
    pub(crate) fn advance(&mut self, dt: f64, ctx: &mut TaskContext<'_>) -> Advance {
        if self.bound.is_empty() || !self.operational || !self.has_work() {
            return Advance::Idle;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Advance::Idle;
        }

        let speed = crew_speed(&self.bound, ctx.workers);
        if speed <= 0.0 {
            info!(task = %self.id, label = %self.label, "Crew exhausted, sending workers to rest");
            self.evict_all(EvictionReason::Exhausted, ctx.workers, ctx.observer);
            return Advance::Exhausted;
        }

        let work = (dt * speed).min(self.duration - self.progress).max(0.0);
        if self.power_draw > 0.0 && !ctx.power.draw(self.power_draw, work) {
            warn!(
                task = %self.id,
                label = %self.label,
                progress = self.progress,
                "Power starved, suspending task"
            );
            self.operational = false;
            self.starved = true;
            self.remember_lead(ctx.memory);
            self.evict_all(EvictionReason::PowerStarved, ctx.workers, ctx.observer);
            return Advance::PowerStarved;
        }

        self.progress = (self.progress + work).min(self.duration);
        if self.progress >= self.duration - PROGRESS_EPSILON {
            self.progress = self.duration;
            Advance::Finished
        } else {
            Advance::Progressed
        }
    }

    /// Advance by `dt` and complete if the work is done.
    pub fn tick(&mut self, dt: f64, ctx: &mut TaskContext<'_>) -> TickOutcome {
        let advance = self.advance(dt, ctx);
        if advance == Advance::Finished {
            self.complete(ctx);
        }
        advance.into()
    }

    /// Finish the current cycle: remember the lead worker, reset progress,
    /// evict everyone, and fire exactly one completion notification.
    pub fn complete(&mut self, ctx: &mut TaskContext<'_>) {
        if self.finished {
            warn!(task = %self.id, "Ignored completion of an already finished task");
            return;
        }
        self.remember_lead(ctx.memory);
        self.progress = 0.0;
        self.cost_paid = false;
        self.evict_all(EvictionReason::Completed, ctx.workers, ctx.observer);
        if self.policy == CompletionPolicy::OneShot {
            self.finished = true;
        }
        info!(
            task = %self.id,
            kind = ?self.kind,
            label = %self.label,
            one_shot = self.finished,
            "Task completed"
        );
        ctx.observer.on_task_completed(self.id);
    }

    /// Record the first bound worker as this task's previous occupant.
    fn remember_lead(&self, memory: &mut AssignmentMemory) {
        if let Some(lead) = self.bound.first().copied() {
            memory.remember(self.id, lead);
        }
    }

    // --- Suspension ---

    /// Suspend or resume the task.
    ///
    /// Suspending remembers the lead worker and evicts every worker once;
    /// suspending again does nothing.
    /// Resuming tries to pull back the remembered worker and returns it if
    /// it was re-bound.
    pub fn set_operational(&mut self, operational: bool, ctx: &mut TaskContext<'_>) -> Option<WorkerId> {
        self.switch_operational(operational, ctx);
        if operational { self.try_reinstate(ctx) } else { None }
    }

    /// Flip the operational flag, evicting on suspension, without pulling
    /// anyone back on resume.
    pub(crate) fn switch_operational(&mut self, operational: bool, ctx: &mut TaskContext<'_>) {
        if operational {
            if !self.operational {
                self.operational = true;
                self.starved = false;
                info!(task = %self.id, label = %self.label, "Task resumed");
            }
        } else if self.operational {
            self.operational = false;
            self.remember_lead(ctx.memory);
            self.evict_all(EvictionReason::Suspended, ctx.workers, ctx.observer);
            info!(task = %self.id, label = %self.label, "Task suspended");
        }
    }

    /// Re-bind the remembered worker if the task is empty, can start, can
    /// pay, and that worker is idle.
    pub(crate) fn try_reinstate(&mut self, ctx: &mut TaskContext<'_>) -> Option<WorkerId> {
        if !self.bound.is_empty() || !self.can_start(ctx.power) || !self.has_resources(ctx.stock) {
            return None;
        }
        let worker = ctx.memory.recall(self.id)?;
        if !ctx.workers.is_idle(worker) {
            return None;
        }
        match self.bind(worker, ctx) {
            Ok(()) => {
                info!(task = %self.id, worker = %worker, "Previous worker reinstated");
                Some(worker)
            }
            Err(err) => {
                debug!(task = %self.id, worker = %worker, %err, "Reinstatement failed");
                None
            }
        }
    }

    // --- Persistence ---

    /// Persisted state.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            progress: self.progress,
            operational: self.operational,
            bound_workers: self.bound.clone(),
        }
    }

    /// Overwrite progress, the operational flag, and bindings from a save.
    ///
    /// Workers are bound silently (no assignment callbacks) and without
    /// paying the cost again. A task with saved progress or workers counts
    /// as already paid. Nothing changes when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`WorkError::TaskFull`] if more workers are saved than fit
    /// - [`WorkError::WorkerNotFound`] for a saved worker missing from the roster
    /// - [`WorkError::AlreadyBound`] for a saved worker bound elsewhere
    pub fn restore(&mut self, snapshot: TaskSnapshot, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        let mut seen = BTreeSet::new();
        let mut crew = snapshot.bound_workers;
        crew.retain(|w| seen.insert(*w));
        if !snapshot.operational && !crew.is_empty() {
            warn!(task = %self.id, count = crew.len(), "Dropping saved workers of a suspended task");
            crew.clear();
        }
        if crew.len() > self.capacity_usize() {
            return Err(WorkError::TaskFull {
                task: self.id,
                capacity: self.capacity,
            });
        }
        for worker in &crew {
            match workers.get(*worker) {
                None => return Err(WorkError::WorkerNotFound(*worker)),
                Some(state) => {
                    if let Some(task) = state.bound_task()
                        && task != self.id
                    {
                        return Err(WorkError::AlreadyBound {
                            worker: *worker,
                            task,
                        });
                    }
                }
            }
        }

        for worker in self.bound.drain(..) {
            workers.set_binding(worker, None);
        }
        for worker in &crew {
            workers.set_binding(*worker, Some(self.id));
        }
        self.bound = crew;
        self.set_progress(snapshot.progress);
        self.operational = snapshot.operational;
        self.starved = false;
        self.cost_paid = !self.bound.is_empty() || self.progress > 0.0;
        debug!(task = %self.id, progress = self.progress, crew = self.bound.len(), "Task restored");
        Ok(())
    }

    /// Set progress, clamped to `[0, duration]`. Non-finite values reset to 0.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, self.duration)
        } else {
            0.0
        };
    }

    // --- Queue support ---

    /// Replace what the task is working on. Progress restarts and the new
    /// cost is unpaid.
    pub(crate) fn reconfigure(&mut self, label: &str, duration: f64, cost: &[ResourceCost]) {
        label.clone_into(&mut self.label);
        self.duration = duration;
        self.resource_cost = cost.to_vec();
        self.progress = 0.0;
        self.cost_paid = false;
    }

    pub(crate) const fn set_has_pending_work(&mut self, pending: bool) {
        self.has_pending_work = pending;
    }

    pub(crate) const fn force_repeat(&mut self) {
        self.policy = CompletionPolicy::Repeat;
    }
}
