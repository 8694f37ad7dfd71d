//! The scheduler: registry of work, FIFO matching of idle workers, and the
//! previous-occupant memory.
//!
//! Registration order is the only ordering the scheduler knows. It decides
//! which task an idle worker is offered (earliest eligible first) and the
//! order in which tasks tick, which in turn decides who gets power first
//! when the pool runs short.
//!
//! Tasks stay in the pending list for their whole life: a task being worked
//! can still take more hands up to its capacity. Only destruction (or
//! reclamation of a finished one-shot) removes a task.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info, warn};

use colony_types::{EvictionReason, QueueSnapshot, TaskId, TaskSnapshot, WorkOrder, WorkerId};
use colony_world::{PowerGrid, ResourceLedger};

use crate::error::WorkError;
use crate::memory::AssignmentMemory;
use crate::observer::WorkObserver;
use crate::task::{Task, TaskContext, TickOutcome};
use crate::work::Work;
use crate::worker::{WorkerRoster, WorkerState};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Settlement-owned collaborators lent to the scheduler for one call.
pub struct WorkEnv<'a> {
    /// Worker speeds and bindings.
    pub workers: &'a mut WorkerRoster,
    /// Shared power pool.
    pub power: &'a mut dyn PowerGrid,
    /// Shared resource stacks.
    pub stock: &'a mut dyn ResourceLedger,
    /// Notification sink.
    pub observer: &'a mut dyn WorkObserver,
}

impl WorkEnv<'_> {
    /// Combine with the scheduler's memory into a per-task context.
    pub fn with_memory<'b>(&'b mut self, memory: &'b mut AssignmentMemory) -> TaskContext<'b> {
        TaskContext {
            workers: &mut *self.workers,
            memory,
            power: &mut *self.power,
            stock: &mut *self.stock,
            observer: &mut *self.observer,
        }
    }
}

/// What happened during one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose progress advanced.
    pub progressed: Vec<TaskId>,
    /// Tasks that fired a completion notification.
    pub completed: Vec<TaskId>,
    /// Tasks suspended by power starvation.
    pub starved: Vec<TaskId>,
    /// Tasks whose crew had zero aggregate speed.
    pub exhausted: Vec<TaskId>,
    /// Finished one-shot tasks removed from the registry.
    pub reclaimed: Vec<TaskId>,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Registry of all live work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheduler {
    /// Registered work by id.
    tasks: BTreeMap<TaskId, Work>,
    /// Registration order.
    pending: Vec<TaskId>,
    /// Last worker per task.
    memory: AssignmentMemory,
    /// Idle workers with a standing request for work, first come first served.
    waiting: VecDeque<WorkerId>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub const fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            pending: Vec::new(),
            memory: AssignmentMemory::new(),
            waiting: VecDeque::new(),
        }
    }

    // --- Registry ---

    /// Register work and announce it.
    ///
    /// Registering an id twice keeps the first registration. Workers with a
    /// standing request are serviced immediately.
    pub fn register(&mut self, work: impl Into<Work>, env: &mut WorkEnv<'_>) -> TaskId {
        let work = work.into();
        let id = work.id();
        if self.tasks.contains_key(&id) {
            warn!(task = %id, "Ignored duplicate registration");
            return id;
        }
        info!(task = %id, label = %work.task().label(), kind = ?work.task().kind(), "Task registered");
        self.tasks.insert(id, work);
        self.pending.push(id);
        env.observer.on_task_available(id);
        self.service_waiting(env);
        id
    }

    /// Re-announce registered work, for example after a delivery made it
    /// affordable again. Returns the standing requests it satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::TaskNotFound`] if no such task is registered.
    pub fn offer(&mut self, task: TaskId, env: &mut WorkEnv<'_>) -> Result<Vec<(WorkerId, TaskId)>, WorkError> {
        if !self.tasks.contains_key(&task) {
            return Err(WorkError::TaskNotFound(task));
        }
        env.observer.on_task_available(task);
        Ok(self.service_waiting(env))
    }

    /// Remove work, evicting its crew with [`EvictionReason::SiteDestroyed`]
    /// and forgetting its memory.
    ///
    /// # Errors
    ///
    /// Returns [`WorkError::TaskNotFound`] if no such task is registered.
    pub fn destroy(&mut self, task: TaskId, env: &mut WorkEnv<'_>) -> Result<Work, WorkError> {
        let mut work = self.tasks.remove(&task).ok_or(WorkError::TaskNotFound(task))?;
        work.evict_all(EvictionReason::SiteDestroyed, env.workers, env.observer);
        for id in work.task_ids() {
            self.memory.forget(id);
        }
        self.pending.retain(|id| *id != task);
        info!(task = %task, "Task destroyed");
        Ok(work)
    }

    /// Look up work.
    pub fn get(&self, task: TaskId) -> Option<&Work> {
        self.tasks.get(&task)
    }

    /// Registered ids in registration order.
    pub fn pending(&self) -> &[TaskId] {
        &self.pending
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Progress bar text for a task.
    pub fn tooltip(&self, task: TaskId) -> Option<String> {
        self.tasks.get(&task).map(Work::tooltip)
    }

    /// The registered work that owns `task` (itself or a composite parent).
    pub fn owner_of(&self, task: TaskId) -> Option<TaskId> {
        if self.tasks.contains_key(&task) {
            return Some(task);
        }
        self.pending
            .iter()
            .copied()
            .find(|id| self.tasks.get(id).is_some_and(|w| w.owns(task)))
    }

    // --- Matching ---

    /// The earliest-registered task `worker` could join right now.
    ///
    /// Skips tasks that cannot start, cannot pay their cost, or are full.
    /// The task stays pending; the caller binds.
    pub fn request_assignment(
        &self,
        worker: WorkerId,
        workers: &WorkerRoster,
        power: &dyn PowerGrid,
        stock: &dyn ResourceLedger,
    ) -> Option<TaskId> {
        if !workers.is_idle(worker) {
            debug!(worker = %worker, "Assignment requested for a busy or unknown worker");
            return None;
        }
        self.pending.iter().copied().find(|id| {
            self.tasks
                .get(id)
                .is_some_and(|w| w.can_start(power) && w.has_resources(stock) && !w.is_full())
        })
    }

    /// Find a task for `worker` and bind it.
    ///
    /// Returns `Ok(None)` when nothing is eligible.
    ///
    /// # Errors
    ///
    /// Any error from the bind itself.
    pub fn assign(&mut self, worker: WorkerId, env: &mut WorkEnv<'_>) -> Result<Option<TaskId>, WorkError> {
        let Some(task) = self.request_assignment(worker, env.workers, env.power, env.stock) else {
            return Ok(None);
        };
        self.bind(task, worker, env)?;
        Ok(Some(task))
    }

    /// Assign `worker` now if possible, otherwise leave a standing request
    /// that is serviced when work appears.
    ///
    /// # Errors
    ///
    /// Any error from the bind itself.
    pub fn await_assignment(
        &mut self,
        worker: WorkerId,
        env: &mut WorkEnv<'_>,
    ) -> Result<Option<TaskId>, WorkError> {
        let assigned = self.assign(worker, env)?;
        if assigned.is_none() && env.workers.is_idle(worker) && !self.waiting.contains(&worker) {
            debug!(worker = %worker, "Worker waiting for work");
            self.waiting.push_back(worker);
        }
        Ok(assigned)
    }

    /// Withdraw a standing request.
    pub fn cancel_waiting(&mut self, worker: WorkerId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|w| *w != worker);
        self.waiting.len() != before
    }

    /// Workers with a standing request, oldest first.
    pub fn waiting(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.waiting.iter().copied()
    }

    /// Try to assign every waiting worker in request order. Workers that
    /// were bound elsewhere or dismissed meanwhile are dropped from the
    /// line. Returns the assignments made.
    pub fn service_waiting(&mut self, env: &mut WorkEnv<'_>) -> Vec<(WorkerId, TaskId)> {
        let mut assigned = Vec::new();
        let mut still_waiting = VecDeque::with_capacity(self.waiting.len());
        while let Some(worker) = self.waiting.pop_front() {
            if !env.workers.is_idle(worker) {
                continue;
            }
            match self.assign(worker, env) {
                Ok(Some(task)) => assigned.push((worker, task)),
                Ok(None) => still_waiting.push_back(worker),
                Err(err) => {
                    warn!(worker = %worker, %err, "Standing request failed");
                    still_waiting.push_back(worker);
                }
            }
        }
        self.waiting = still_waiting;
        assigned
    }

    // --- Memory ---

    /// Record `worker` as the last occupant of `task`.
    pub fn remember(&mut self, task: TaskId, worker: WorkerId) {
        self.memory.remember(task, worker);
    }

    /// The last occupant of `task`.
    pub fn recall(&self, task: TaskId) -> Option<WorkerId> {
        self.memory.recall(task)
    }

    /// Drop the memory entry for `task`.
    pub fn forget(&mut self, task: TaskId) -> Option<WorkerId> {
        self.memory.forget(task)
    }

    /// The assignment memory.
    pub const fn memory(&self) -> &AssignmentMemory {
        &self.memory
    }

    // --- Lifecycle forwarding ---

    fn work_mut(&mut self, task: TaskId) -> Result<&mut Work, WorkError> {
        self.tasks.get_mut(&task).ok_or(WorkError::TaskNotFound(task))
    }

    /// Bind `worker` to `task`.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`], or any error from [`Task::bind`].
    pub fn bind(&mut self, task: TaskId, worker: WorkerId, env: &mut WorkEnv<'_>) -> Result<(), WorkError> {
        let work = self.tasks.get_mut(&task).ok_or(WorkError::TaskNotFound(task))?;
        work.bind(worker, &mut env.with_memory(&mut self.memory))?;
        self.waiting.retain(|w| *w != worker);
        Ok(())
    }

    /// Unbind `worker` from `task` without notification.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`] or [`WorkError::NotBound`].
    pub fn unbind(&mut self, task: TaskId, worker: WorkerId, workers: &mut WorkerRoster) -> Result<(), WorkError> {
        self.work_mut(task)?.unbind(worker, workers)
    }

    /// Suspend or resume `task`. Returns a reinstated worker, if any.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`].
    pub fn set_operational(
        &mut self,
        task: TaskId,
        operational: bool,
        env: &mut WorkEnv<'_>,
    ) -> Result<Option<WorkerId>, WorkError> {
        let work = self.tasks.get_mut(&task).ok_or(WorkError::TaskNotFound(task))?;
        let reinstated = work.set_operational(operational, &mut env.with_memory(&mut self.memory));
        if let Some(worker) = reinstated {
            self.waiting.retain(|w| *w != worker);
        }
        Ok(reinstated)
    }

    /// Append an order to a queue task.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`], [`WorkError::NotQueue`], or
    /// [`WorkError::InvalidPayload`].
    pub fn enqueue_order(&mut self, task: TaskId, order: WorkOrder, env: &mut WorkEnv<'_>) -> Result<(), WorkError> {
        let Work::Queue(queue) = self.tasks.get_mut(&task).ok_or(WorkError::TaskNotFound(task))? else {
            return Err(WorkError::NotQueue(task));
        };
        queue.enqueue(order, &mut env.with_memory(&mut self.memory))
    }

    /// Install a new active child on a composite task and bind `worker` to
    /// it.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`], [`WorkError::NotComposite`], or any bind
    /// error.
    pub fn set_active_child(
        &mut self,
        task: TaskId,
        child: Task,
        worker: Option<WorkerId>,
        env: &mut WorkEnv<'_>,
    ) -> Result<(), WorkError> {
        let Work::Composite(composite) = self.tasks.get_mut(&task).ok_or(WorkError::TaskNotFound(task))? else {
            return Err(WorkError::NotComposite(task));
        };
        composite.set_active_child(child, worker, &mut env.with_memory(&mut self.memory))
    }

    /// Remove a worker from the settlement: unbind it, drop its standing
    /// request and memory entries, and take it off the roster.
    ///
    /// # Errors
    ///
    /// [`WorkError::WorkerNotFound`].
    pub fn dismiss_worker(&mut self, worker: WorkerId, workers: &mut WorkerRoster) -> Result<WorkerState, WorkError> {
        if let Some(bound) = workers.bound_task(worker)
            && let Some(owner) = self.owner_of(bound)
        {
            self.work_mut(owner)?.unbind(worker, workers)?;
        }
        self.cancel_waiting(worker);
        self.memory.forget_worker(worker);
        let state = workers.remove(worker).ok_or(WorkError::WorkerNotFound(worker))?;
        info!(worker = %worker, name = %state.name, "Worker dismissed");
        Ok(state)
    }

    // --- Ticking ---

    /// Tick every task once in registration order, then reclaim finished
    /// one-shot tasks.
    pub fn tick(&mut self, dt: f64, env: &mut WorkEnv<'_>) -> TickReport {
        let mut report = TickReport::default();
        for id in &self.pending {
            let Some(work) = self.tasks.get_mut(id) else {
                continue;
            };
            let outcome = work.tick(dt, &mut env.with_memory(&mut self.memory));
            match outcome {
                TickOutcome::Idle => {}
                TickOutcome::Progressed => report.progressed.push(*id),
                TickOutcome::Completed => report.completed.push(*id),
                TickOutcome::Exhausted => report.exhausted.push(*id),
                TickOutcome::PowerStarved => report.starved.push(*id),
            }
        }

        let finished: Vec<TaskId> = self
            .pending
            .iter()
            .copied()
            .filter(|id| self.tasks.get(id).is_some_and(Work::is_reclaimable))
            .collect();
        for id in finished {
            self.tasks.remove(&id);
            self.memory.forget(id);
            self.pending.retain(|p| *p != id);
            debug!(task = %id, "Finished one-shot task reclaimed");
            report.reclaimed.push(id);
        }
        report
    }

    // --- Persistence ---

    /// Persisted state of the task currently receiving calls.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`].
    pub fn snapshot_task(&self, task: TaskId) -> Result<TaskSnapshot, WorkError> {
        self.tasks
            .get(&task)
            .map(|w| w.task().snapshot())
            .ok_or(WorkError::TaskNotFound(task))
    }

    /// Persisted order state of a queue task.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`] or [`WorkError::NotQueue`].
    pub fn snapshot_queue(&self, task: TaskId) -> Result<QueueSnapshot, WorkError> {
        match self.tasks.get(&task) {
            Some(Work::Queue(queue)) => Ok(queue.snapshot()),
            Some(_) => Err(WorkError::NotQueue(task)),
            None => Err(WorkError::TaskNotFound(task)),
        }
    }

    /// Restore the task currently receiving calls (a plain task, or a
    /// composite's base or active child) from a save.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`], [`WorkError::NotQueue`] for queue tasks
    /// (use [`Self::restore_queue`]), or see [`Task::restore`].
    pub fn restore_task(
        &mut self,
        task: TaskId,
        snapshot: TaskSnapshot,
        workers: &mut WorkerRoster,
    ) -> Result<(), WorkError> {
        match self.work_mut(task)? {
            Work::Single(single) => single.restore(snapshot, workers),
            Work::Composite(composite) => composite.restore(snapshot, workers),
            Work::Queue(_) => Err(WorkError::NotQueue(task)),
        }
    }

    /// Restore a queue task's orders and state from a save. Returns how many
    /// saved orders were invalid and skipped.
    ///
    /// # Errors
    ///
    /// [`WorkError::TaskNotFound`], [`WorkError::NotQueue`], or see
    /// [`Task::restore`].
    pub fn restore_queue(
        &mut self,
        task: TaskId,
        queue: QueueSnapshot,
        snapshot: TaskSnapshot,
        workers: &mut WorkerRoster,
    ) -> Result<usize, WorkError> {
        let Work::Queue(target) = self.work_mut(task)? else {
            return Err(WorkError::NotQueue(task));
        };
        target.restore(queue, snapshot, workers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use colony_types::{Resource, SiteKind, TaskPhase};

    use crate::composite::CompositeTask;
    use crate::observer::WorkEvent;
    use crate::queue::TaskQueue;
    use crate::task::TaskSpec;
    use crate::testing::Rig;

    fn farm(label: &str) -> Task {
        Task::new(TaskSpec::new(SiteKind::Farm, label, 5.0)).unwrap()
    }

    #[test]
    fn register_announces_and_dedupes() {
        let mut rig = Rig::new();
        let mut scheduler = Scheduler::new();
        let task = farm("North");
        let copy = task.clone();
        let id = scheduler.register(task, &mut rig.env());
        scheduler.register(copy, &mut rig.env());
        assert_eq!(scheduler.pending(), &[id]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(rig.log.events().len(), 1);
    }

    #[test]
    fn request_assignment_is_fifo() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let first = scheduler.register(farm("North"), &mut rig.env());
        scheduler.register(farm("South"), &mut rig.env());
        assert_eq!(
            scheduler.request_assignment(worker, &rig.workers, &rig.power, &rig.stock),
            Some(first)
        );
    }

    #[test]
    fn request_assignment_skips_ineligible_tasks() {
        let mut rig = Rig::with_power(5.0);
        let worker = rig.worker(1.0);
        let busy = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let full = scheduler.register(farm("Full"), &mut rig.env());
        scheduler.bind(full, busy, &mut rig.env()).unwrap();
        let hungry_turret = Task::new(TaskSpec::new(SiteKind::Turret, "Gun", 10.0).with_power_draw(1.0)).unwrap();
        scheduler.register(hungry_turret, &mut rig.env());
        let costly = Task::new(TaskSpec::new(SiteKind::Farm, "Seeded", 5.0).with_cost(Resource::Seed, 1)).unwrap();
        scheduler.register(costly, &mut rig.env());
        let open = scheduler.register(farm("Open"), &mut rig.env());

        assert_eq!(
            scheduler.request_assignment(worker, &rig.workers, &rig.power, &rig.stock),
            Some(open)
        );
    }

    #[test]
    fn assigned_task_stays_pending_for_more_hands() {
        let mut rig = Rig::new();
        let (a, b) = (rig.worker(1.0), rig.worker(1.0));
        let mut scheduler = Scheduler::new();
        let barn = Task::new(TaskSpec::new(SiteKind::Construction, "Barn", 20.0).with_capacity(2)).unwrap();
        let id = scheduler.register(barn, &mut rig.env());
        assert_eq!(scheduler.assign(a, &mut rig.env()).unwrap(), Some(id));
        assert_eq!(scheduler.assign(b, &mut rig.env()).unwrap(), Some(id));
        assert_eq!(scheduler.pending(), &[id]);
        assert_eq!(scheduler.get(id).map(Work::bound_workers), Some(&[a, b][..]));
    }

    #[test]
    fn waiting_worker_is_served_on_register() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.await_assignment(worker, &mut rig.env()).unwrap(), None);
        assert_eq!(scheduler.waiting().collect::<Vec<_>>(), vec![worker]);

        let id = scheduler.register(farm("North"), &mut rig.env());
        assert_eq!(rig.workers.bound_task(worker), Some(id));
        assert_eq!(scheduler.waiting().count(), 0);
    }

    #[test]
    fn offer_serves_the_line_after_a_delivery() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let seeded = Task::new(TaskSpec::new(SiteKind::Farm, "North", 5.0).with_cost(Resource::Seed, 1)).unwrap();
        let id = scheduler.register(seeded, &mut rig.env());
        assert_eq!(scheduler.await_assignment(worker, &mut rig.env()).unwrap(), None);

        rig.stock.deposit(Resource::Seed, 1).unwrap();
        assert_eq!(scheduler.offer(id, &mut rig.env()).unwrap(), vec![(worker, id)]);
        assert_eq!(rig.stock.quantity(Resource::Seed), 0);
        assert_eq!(rig.log.events().iter().filter(|e| matches!(e, WorkEvent::Available(_))).count(), 2);
        assert!(matches!(
            scheduler.offer(TaskId::new(), &mut rig.env()),
            Err(WorkError::TaskNotFound(_))
        ));
    }

    #[test]
    fn tick_reclaims_finished_one_shots() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let wall = Task::new(TaskSpec::new(SiteKind::Construction, "Wall", 1.0).one_shot()).unwrap();
        let id = scheduler.register(wall, &mut rig.env());
        scheduler.assign(worker, &mut rig.env()).unwrap();
        let report = scheduler.tick(1.0, &mut rig.env());
        assert_eq!(report.completed, vec![id]);
        assert_eq!(report.reclaimed, vec![id]);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.recall(id), None);
    }

    #[test]
    fn destroy_evicts_and_forgets() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(farm("North"), &mut rig.env());
        scheduler.assign(worker, &mut rig.env()).unwrap();
        scheduler.remember(id, worker);
        scheduler.destroy(id, &mut rig.env()).unwrap();
        assert!(rig.workers.is_idle(worker));
        assert_eq!(rig.log.evictions_of(worker), vec![EvictionReason::SiteDestroyed]);
        assert_eq!(scheduler.recall(id), None);
        assert!(scheduler.pending().is_empty());
        assert!(matches!(scheduler.destroy(id, &mut rig.env()), Err(WorkError::TaskNotFound(_))));
    }

    #[test]
    fn suspend_and_resume_restores_previous_worker() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(farm("North"), &mut rig.env());
        scheduler.assign(worker, &mut rig.env()).unwrap();
        scheduler.remember(id, worker);
        scheduler.set_operational(id, false, &mut rig.env()).unwrap();
        assert_eq!(scheduler.get(id).map(Work::phase), Some(TaskPhase::Suspended));
        let back = scheduler.set_operational(id, true, &mut rig.env()).unwrap();
        assert_eq!(back, Some(worker));
        assert_eq!(scheduler.get(id).map(Work::phase), Some(TaskPhase::Active));
    }

    #[test]
    fn enqueue_and_child_check_work_shape() {
        let mut rig = Rig::new();
        let mut scheduler = Scheduler::new();
        let plain = scheduler.register(farm("North"), &mut rig.env());
        assert_eq!(
            scheduler.enqueue_order(plain, WorkOrder::new("Stew", 1.0), &mut rig.env()),
            Err(WorkError::NotQueue(plain))
        );
        assert_eq!(
            scheduler.set_active_child(plain, farm("Sub"), None, &mut rig.env()),
            Err(WorkError::NotComposite(plain))
        );

        let kitchen = scheduler.register(
            TaskQueue::new(TaskSpec::new(SiteKind::Kitchen, "Hearth", 1.0)).unwrap(),
            &mut rig.env(),
        );
        scheduler
            .enqueue_order(kitchen, WorkOrder::new("Stew", 1.0), &mut rig.env())
            .unwrap();
        assert_eq!(scheduler.snapshot_queue(kitchen).unwrap().current.map(|o| o.label), Some("Stew".to_owned()));
    }

    #[test]
    fn dismiss_worker_unbinds_from_composite_child() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let station = scheduler.register(
            CompositeTask::new(TaskSpec::new(SiteKind::Cleaning, "Closet", 5.0)).unwrap(),
            &mut rig.env(),
        );
        let puddle = farm("Puddle");
        let puddle_id = puddle.id();
        scheduler
            .set_active_child(station, puddle, Some(worker), &mut rig.env())
            .unwrap();
        assert_eq!(scheduler.owner_of(puddle_id), Some(station));

        let state = scheduler.dismiss_worker(worker, &mut rig.workers).unwrap();
        assert_eq!(state.id, worker);
        assert!(scheduler.get(station).is_some_and(|w| w.bound_workers().is_empty()));
        assert!(rig.workers.is_empty());
    }

    #[test]
    fn snapshot_and_restore_task() {
        let mut rig = Rig::new();
        let worker = rig.worker(1.0);
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(farm("North"), &mut rig.env());
        let saved = TaskSnapshot {
            progress: 2.5,
            operational: true,
            bound_workers: vec![worker],
        };
        scheduler.restore_task(id, saved.clone(), &mut rig.workers).unwrap();
        assert_eq!(scheduler.snapshot_task(id).unwrap(), saved);
    }
}
