//! End-to-end scheduling scenarios.
//!
//! Each test drives a [`Scheduler`] through the public API with a real
//! [`PowerPool`] and [`Stockpile`], ticking with fixed `dt` and checking
//! the observable results: bindings, progress, notifications, and power.

#![allow(clippy::unwrap_used)]

use colony_types::{
    EvictionReason, QueueSnapshot, Resource, SiteKind, TaskId, TaskPhase, TaskSnapshot, WorkOrder, WorkerId,
};
use colony_work::{EventLog, Scheduler, Task, TaskQueue, TaskSpec, TickReport, Work, WorkEnv, WorkerRoster};
use colony_world::{AuditResult, PowerPool, Stockpile};

struct Settlement {
    workers: WorkerRoster,
    power: PowerPool,
    stock: Stockpile,
    log: EventLog,
    scheduler: Scheduler,
}

impl Settlement {
    fn with_power(pool: PowerPool) -> Self {
        Self {
            workers: WorkerRoster::new(),
            power: pool,
            stock: Stockpile::new(),
            log: EventLog::new(),
            scheduler: Scheduler::new(),
        }
    }

    fn new() -> Self {
        Self::with_power(PowerPool::fixed(1_000.0).unwrap())
    }

    fn env(&mut self) -> (&mut Scheduler, WorkEnv<'_>) {
        (
            &mut self.scheduler,
            WorkEnv {
                workers: &mut self.workers,
                power: &mut self.power,
                stock: &mut self.stock,
                observer: &mut self.log,
            },
        )
    }

    fn register(&mut self, work: impl Into<Work>) -> TaskId {
        let (scheduler, mut env) = self.env();
        scheduler.register(work, &mut env)
    }

    fn bind(&mut self, task: TaskId, worker: WorkerId) {
        let (scheduler, mut env) = self.env();
        scheduler.bind(task, worker, &mut env).unwrap();
    }

    fn tick(&mut self, dt: f64) -> TickReport {
        let (scheduler, mut env) = self.env();
        scheduler.tick(dt, &mut env)
    }

    fn progress(&self, task: TaskId) -> f64 {
        self.scheduler.get(task).map_or(f64::NAN, |w| w.task().progress())
    }

    fn phase(&self, task: TaskId) -> Option<TaskPhase> {
        self.scheduler.get(task).map(Work::phase)
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_worker_completes_exactly_once() {
    let mut s = Settlement::new();
    let worker = s.workers.spawn("Ada", 1.0);
    let field = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "Field", 5.0)).unwrap());
    s.bind(field, worker);

    for dt in [0.5, 1.25, 0.25, 2.0, 1.0] {
        s.tick(dt);
    }
    assert_eq!(s.log.completions_of(field), 1);
    assert!(approx(s.progress(field), 0.0));
    assert!(s.workers.is_idle(worker));

    s.tick(1.0);
    assert_eq!(s.log.completions_of(field), 1);
}

#[test]
fn small_steps_summing_to_duration_complete() {
    let mut s = Settlement::new();
    let worker = s.workers.spawn("Ada", 1.0);
    let field = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "Field", 5.0)).unwrap());
    s.bind(field, worker);

    for _ in 0..50 {
        s.tick(0.1);
    }
    assert_eq!(s.log.completions_of(field), 1);
    assert!(approx(s.progress(field), 0.0));
}

#[test]
fn three_workers_finish_in_ten_over_root_three() {
    let mut s = Settlement::new();
    let crew: Vec<WorkerId> = (0..3).map(|_| s.workers.spawn("Hand", 1.0)).collect();
    let barn = s.register(
        Task::new(TaskSpec::new(SiteKind::Construction, "Barn", 10.0).with_capacity(3)).unwrap(),
    );
    for worker in &crew {
        s.bind(barn, *worker);
    }

    let dt = 0.01;
    let mut elapsed = 0.0;
    let mut ticks = 0_u32;
    while s.log.completions_of(barn) == 0 && ticks < 10_000 {
        s.tick(dt);
        ticks = ticks.saturating_add(1);
        elapsed = f64::from(ticks) * dt;
    }
    assert_eq!(s.log.completions_of(barn), 1);
    let expected = 10.0 / 3.0_f64.sqrt();
    assert!((elapsed - expected).abs() <= dt, "took {elapsed}s, expected ~{expected}s");
}

#[test]
fn power_starvation_suspends_mid_task() {
    let mut s = Settlement::with_power(PowerPool::fixed(15.0).unwrap());
    let gunner = s.workers.spawn("Gunner", 1.0);
    let turret = s.register(
        Task::new(TaskSpec::new(SiteKind::Turret, "Gun", 10.0).with_power_draw(2.0)).unwrap(),
    );
    s.bind(turret, gunner);

    for _ in 0..15 {
        let report = s.tick(0.5);
        assert!(report.starved.is_empty());
    }
    assert!(approx(s.progress(turret), 7.5));
    assert!(approx(s.power.charge(), 0.0));

    let report = s.tick(0.5);
    assert_eq!(report.starved, vec![turret]);
    assert_eq!(s.phase(turret), Some(TaskPhase::Suspended));
    assert!(approx(s.progress(turret), 7.5));
    assert!(s.workers.is_idle(gunner));
    assert_eq!(s.log.evictions_of(gunner), vec![EvictionReason::PowerStarved]);
    assert_eq!(s.log.completions_of(turret), 0);
}

#[test]
fn starved_task_resumes_with_its_previous_worker() {
    let mut s = Settlement::with_power(PowerPool::new(10.0, 1.0, 5.0).unwrap());
    let gunner = s.workers.spawn("Gunner", 1.0);
    let turret = s.register(
        Task::new(TaskSpec::new(SiteKind::Turret, "Gun", 2.0).with_power_draw(1.0)).unwrap(),
    );
    s.bind(turret, gunner);
    s.tick(1.0);
    s.tick(1.0);
    assert_eq!(s.phase(turret), Some(TaskPhase::Suspended));

    s.power.regenerate(2.0);
    let (scheduler, mut env) = s.env();
    let back = scheduler.set_operational(turret, true, &mut env).unwrap();
    assert_eq!(back, Some(gunner));
    assert_eq!(s.phase(turret), Some(TaskPhase::Active));
    assert!(approx(s.progress(turret), 1.0));
}

#[test]
fn queue_runs_both_orders_with_one_worker() {
    let mut s = Settlement::new();
    let cook = s.workers.spawn("Cook", 1.0);
    let kitchen = s.register(TaskQueue::new(TaskSpec::new(SiteKind::Kitchen, "Hearth", 1.0)).unwrap());
    {
        let (scheduler, mut env) = s.env();
        scheduler.enqueue_order(kitchen, WorkOrder::new("A", 3.0), &mut env).unwrap();
        scheduler.enqueue_order(kitchen, WorkOrder::new("B", 4.0), &mut env).unwrap();
    }
    s.bind(kitchen, cook);

    for tick in 1..=14 {
        s.tick(0.5);
        if tick < 14 {
            assert_eq!(
                s.workers.bound_task(cook),
                Some(kitchen),
                "cook left the kitchen after tick {tick}"
            );
        }
    }
    assert_eq!(s.log.completions_of(kitchen), 2);
    assert_eq!(s.log.assignments_of(cook), 1);
    assert_eq!(s.log.evictions_of(cook), vec![EvictionReason::Completed]);
}

#[test]
fn queue_reloads_from_a_json_save() {
    let mut s = Settlement::new();
    let cook = s.workers.spawn("Cook", 1.0);
    let kitchen = s.register(TaskQueue::new(TaskSpec::new(SiteKind::Kitchen, "Hearth", 1.0)).unwrap());
    {
        let (scheduler, mut env) = s.env();
        scheduler.enqueue_order(kitchen, WorkOrder::new("Stew", 3.0), &mut env).unwrap();
        scheduler.enqueue_order(kitchen, WorkOrder::new("Bread", 4.0), &mut env).unwrap();
    }
    s.bind(kitchen, cook);
    s.tick(1.0);
    s.tick(1.0);

    let save = serde_json::to_string(&(
        s.scheduler.snapshot_task(kitchen).unwrap(),
        s.scheduler.snapshot_queue(kitchen).unwrap(),
    ))
    .unwrap();

    s.tick(1.0);
    s.tick(1.0);
    assert_eq!(s.log.completions_of(kitchen), 1);
    assert!(approx(s.progress(kitchen), 1.0));

    let (task, queue): (TaskSnapshot, QueueSnapshot) = serde_json::from_str(&save).unwrap();
    let skipped = s
        .scheduler
        .restore_queue(kitchen, queue, task, &mut s.workers)
        .unwrap();
    assert_eq!(skipped, 0);
    assert!(approx(s.progress(kitchen), 2.0));
    assert_eq!(s.workers.bound_task(cook), Some(kitchen));
    let restored = s.scheduler.snapshot_queue(kitchen).unwrap();
    assert_eq!(restored.current.map(|o| o.label), Some("Stew".to_owned()));
    assert_eq!(restored.pending.len(), 1);
}

#[test]
fn request_assignment_prefers_first_registered() {
    let mut s = Settlement::new();
    let worker = s.workers.spawn("Ada", 1.0);
    let first = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "East", 5.0)).unwrap());
    let second = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "West", 5.0)).unwrap());
    assert_ne!(first, second);
    let offered = s
        .scheduler
        .request_assignment(worker, &s.workers, &s.power, &s.stock);
    assert_eq!(offered, Some(first));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn capacity_is_never_exceeded() {
    let mut s = Settlement::new();
    let crew: Vec<WorkerId> = (0..7).map(|_| s.workers.spawn("Hand", 1.0)).collect();
    let pair_a = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "A", 3.0).with_capacity(2)).unwrap());
    let pair_b = s.register(Task::new(TaskSpec::new(SiteKind::Farm, "B", 3.0).with_capacity(2)).unwrap());
    let solo = s.register(Task::new(TaskSpec::new(SiteKind::Bed, "Cot", 3.0)).unwrap());

    for round in 0..6 {
        for worker in &crew {
            let (scheduler, mut env) = s.env();
            scheduler.await_assignment(*worker, &mut env).unwrap();
        }
        s.tick(0.75 + f64::from(round) * 0.25);
        for (task, capacity) in [(pair_a, 2), (pair_b, 2), (solo, 1)] {
            let bound = s.scheduler.get(task).map_or(0, |w| w.bound_workers().len());
            assert!(bound <= capacity, "task over capacity in round {round}");
        }
    }
}

#[test]
fn earlier_turret_gets_power_under_shortage() {
    let mut s = Settlement::with_power(PowerPool::new(3.0, 3.0, 0.0).unwrap());
    let (a, b) = (s.workers.spawn("A", 1.0), s.workers.spawn("B", 1.0));
    let east = s.register(Task::new(TaskSpec::new(SiteKind::Turret, "East", 10.0).with_power_draw(2.0)).unwrap());
    let west = s.register(Task::new(TaskSpec::new(SiteKind::Turret, "West", 10.0).with_power_draw(2.0)).unwrap());
    s.bind(east, a);
    s.bind(west, b);

    s.power.begin_tick(1);
    let report = s.tick(1.0);
    assert_eq!(report.progressed, vec![east]);
    assert_eq!(report.starved, vec![west]);
    assert!(s.power.audit().drawn() <= s.power.audit().opening_charge());
    assert_eq!(s.power.verify_conservation(), AuditResult::Balanced);
}

#[test]
fn progress_is_monotonic_until_completion() {
    let mut s = Settlement::new();
    let (a, b) = (s.workers.spawn("A", 0.7), s.workers.spawn("B", 1.3));
    let mill = s.register(Task::new(TaskSpec::new(SiteKind::Workshop, "Mill", 6.0).with_capacity(2)).unwrap());
    s.bind(mill, a);
    s.bind(mill, b);

    let mut previous = 0.0;
    while s.log.completions_of(mill) == 0 {
        s.tick(0.2);
        let now = s.progress(mill);
        if s.log.completions_of(mill) == 0 {
            assert!(now >= previous);
            assert!(now <= 6.0);
            previous = now;
        } else {
            assert!(approx(now, 0.0));
        }
    }
}

#[test]
fn suspending_twice_evicts_once() {
    let mut s = Settlement::new();
    let (a, b) = (s.workers.spawn("A", 1.0), s.workers.spawn("B", 1.0));
    let barn = s.register(
        Task::new(TaskSpec::new(SiteKind::Construction, "Barn", 10.0).with_capacity(2)).unwrap(),
    );
    s.bind(barn, a);
    s.bind(barn, b);
    s.tick(1.0);
    let before = s.progress(barn);

    for _ in 0..2 {
        let (scheduler, mut env) = s.env();
        scheduler.set_operational(barn, false, &mut env).unwrap();
    }
    assert_eq!(s.log.evictions_of(a), vec![EvictionReason::Suspended]);
    assert_eq!(s.log.evictions_of(b), vec![EvictionReason::Suspended]);
    assert!(approx(s.progress(barn), before));
}

#[test]
fn resources_are_paid_once_per_cycle() {
    let mut s = Settlement::new();
    s.stock.deposit(Resource::Seed, 2).unwrap();
    let farmer = s.workers.spawn("Farmer", 1.0);
    let field = s.register(
        Task::new(TaskSpec::new(SiteKind::Farm, "Field", 2.0).with_cost(Resource::Seed, 1)).unwrap(),
    );

    for _ in 0..3 {
        let (scheduler, mut env) = s.env();
        scheduler.await_assignment(farmer, &mut env).unwrap();
        s.tick(1.0);
        s.tick(1.0);
    }
    assert_eq!(s.log.completions_of(field), 2);
    assert_eq!(s.stock.quantity(Resource::Seed), 0);
    assert!(s.workers.is_idle(farmer));
}
