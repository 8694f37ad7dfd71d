//! The settlement: clock, scheduler, workers, power, and stockpile in one
//! place, and the tick that drives them.
//!
//! Each call to [`Settlement::run_tick`] runs these phases in order:
//!
//! 1. **Clock** -- advance one tick of `dt` simulated seconds.
//! 2. **Power** -- regenerate the pool, then open the tick's audit window.
//! 3. **Assignment** -- serve workers with a standing request for work.
//! 4. **Work** -- tick every task in registration order.
//! 5. **Audit** -- verify that no more power was drawn than the pool held
//!    when the window opened.

use tracing::{debug, info};

use colony_types::{TaskId, WorkerId};
use colony_work::{Scheduler, TickReport, Work, WorkEnv, WorkError, WorkObserver, WorkerRoster, WorkerState};
use colony_world::{AuditResult, PowerAnomaly, PowerPool, Stockpile, WorldError};

use crate::clock::{ClockError, SimClock};
use crate::config::SimulationConfig;

/// Errors that can occur while building or ticking a settlement.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A stockpile or power pool operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A scheduling operation failed.
    #[error("work error: {source}")]
    Work {
        /// The underlying work error.
        #[from]
        source: WorkError,
    },

    /// More power left the pool during a tick than it held at the start.
    #[error("{0}")]
    PowerOverdraw(PowerAnomaly),
}

/// What one settlement tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick that just ran.
    pub tick: u64,
    /// Simulated seconds since tick 0.
    pub elapsed: f64,
    /// Power regenerated before work began.
    pub regenerated: f64,
    /// Power drawn by tasks.
    pub drawn: f64,
    /// Charge left after the tick.
    pub charge: f64,
    /// Standing requests served this tick.
    pub assigned: Vec<(WorkerId, TaskId)>,
    /// Per-task outcomes.
    pub report: TickReport,
}

/// A running settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    name: String,
    clock: SimClock,
    scheduler: Scheduler,
    workers: WorkerRoster,
    power: PowerPool,
    stock: Stockpile,
}

impl Settlement {
    /// Assemble a settlement from explicit parts, with no workers or tasks.
    pub fn new(name: &str, clock: SimClock, power: PowerPool, stock: Stockpile) -> Self {
        Self {
            name: name.to_owned(),
            clock,
            scheduler: Scheduler::new(),
            workers: WorkerRoster::new(),
            power,
            stock,
        }
    }

    /// Build the clock, power pool, and stockpile from configuration.
    /// Workers and tasks are added by the caller.
    ///
    /// # Errors
    ///
    /// [`TickError::Clock`] for invalid time settings, [`TickError::World`]
    /// for invalid power settings or starting stacks above the limit.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TickError> {
        let clock = SimClock::new(&config.time)?;
        let power = PowerPool::new(
            config.power.capacity,
            config.power.initial_charge,
            config.power.regen_per_second,
        )?;
        let mut stock = config
            .stockpile
            .limit
            .map_or_else(Stockpile::new, Stockpile::with_limit);
        for (&resource, &quantity) in &config.stockpile.initial {
            stock.deposit(resource, quantity)?;
        }
        info!(
            name = %config.world.name,
            dt = clock.dt(),
            power = power.charge(),
            stock = stock.total(),
            "Settlement founded"
        );
        Ok(Self::new(&config.world.name, clock, power, stock))
    }

    // --- Accessors ---

    /// Settlement name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The scheduler.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The worker roster.
    pub const fn workers(&self) -> &WorkerRoster {
        &self.workers
    }

    /// Mutable roster access for speed changes (hunger, injuries).
    pub const fn workers_mut(&mut self) -> &mut WorkerRoster {
        &mut self.workers
    }

    /// The power pool.
    pub const fn power(&self) -> &PowerPool {
        &self.power
    }

    /// The stockpile.
    pub const fn stock(&self) -> &Stockpile {
        &self.stock
    }

    /// Mutable stockpile access for deliveries.
    pub const fn stock_mut(&mut self) -> &mut Stockpile {
        &mut self.stock
    }

    /// Tooltips of every registered task in registration order.
    pub fn tooltips(&self) -> Vec<(TaskId, String)> {
        self.scheduler
            .pending()
            .iter()
            .filter_map(|id| self.scheduler.tooltip(*id).map(|text| (*id, text)))
            .collect()
    }

    // --- Operations ---

    /// Lend the scheduler and its environment to `f`.
    pub fn with_env<R>(
        &mut self,
        observer: &mut dyn WorkObserver,
        f: impl FnOnce(&mut Scheduler, &mut WorkEnv<'_>) -> R,
    ) -> R {
        let mut env = WorkEnv {
            workers: &mut self.workers,
            power: &mut self.power,
            stock: &mut self.stock,
            observer,
        };
        f(&mut self.scheduler, &mut env)
    }

    /// Add a worker to the roster.
    pub fn hire(&mut self, name: &str, speed: f64) -> WorkerId {
        let id = self.workers.spawn(name, speed);
        debug!(worker = %id, name, speed, "Worker hired");
        id
    }

    /// Remove a worker from the settlement.
    ///
    /// # Errors
    ///
    /// [`WorkError::WorkerNotFound`].
    pub fn dismiss(&mut self, worker: WorkerId) -> Result<WorkerState, WorkError> {
        self.scheduler.dismiss_worker(worker, &mut self.workers)
    }

    /// Register work with the scheduler.
    pub fn register(&mut self, work: impl Into<Work>, observer: &mut dyn WorkObserver) -> TaskId {
        self.with_env(observer, |scheduler, env| scheduler.register(work, env))
    }

    /// Assign `worker` now, or leave a standing request.
    ///
    /// # Errors
    ///
    /// Any bind error.
    pub fn request_work(
        &mut self,
        worker: WorkerId,
        observer: &mut dyn WorkObserver,
    ) -> Result<Option<TaskId>, WorkError> {
        self.with_env(observer, |scheduler, env| scheduler.await_assignment(worker, env))
    }

    /// Run one tick.
    ///
    /// # Errors
    ///
    /// [`TickError::Clock`] on tick overflow, [`TickError::PowerOverdraw`]
    /// if the power audit fails.
    pub fn run_tick(&mut self, observer: &mut dyn WorkObserver) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance()?;
        let dt = self.clock.dt();

        let regenerated = self.power.regenerate(dt);
        self.power.begin_tick(tick);

        let (assigned, report) = self.with_env(observer, |scheduler, env| {
            let assigned = scheduler.service_waiting(env);
            let report = scheduler.tick(dt, env);
            (assigned, report)
        });

        if let AuditResult::Overdraw(anomaly) = self.power.verify_conservation() {
            return Err(TickError::PowerOverdraw(anomaly));
        }

        let summary = TickSummary {
            tick,
            elapsed: self.clock.elapsed(),
            regenerated,
            drawn: self.power.audit().drawn(),
            charge: self.power.charge(),
            assigned,
            report,
        };
        debug!(
            tick,
            completed = summary.report.completed.len(),
            starved = summary.report.starved.len(),
            drawn = summary.drawn,
            charge = summary.charge,
            "Tick complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use colony_types::{Resource, SiteKind};
    use colony_work::{EventLog, Task, TaskSpec};

    fn hamlet(power: PowerPool) -> Settlement {
        Settlement::new("Test", SimClock::from_parts(0, 1.0, 10).unwrap(), power, Stockpile::new())
    }

    #[test]
    fn from_config_applies_starting_state() {
        let config = SimulationConfig::default();
        let settlement = Settlement::from_config(&config).unwrap();
        assert_eq!(settlement.name(), "Hollow Creek");
        assert_eq!(settlement.stock().quantity(Resource::Wood), 20);
        assert!((settlement.power().charge() - 40.0).abs() < 1e-9);
        assert!(settlement.workers().is_empty());
    }

    #[test]
    fn from_config_rejects_stock_over_limit() {
        let yaml = "stockpile:\n  limit: 5\n  initial:\n    wood: 9\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(matches!(Settlement::from_config(&config), Err(TickError::World { .. })));
    }

    #[test]
    fn run_tick_regenerates_before_drawing() {
        let mut settlement = hamlet(PowerPool::new(10.0, 0.0, 2.0).unwrap());
        let mut log = EventLog::new();
        let gunner = settlement.hire("Gunner", 1.0);
        let turret = Task::new(TaskSpec::new(SiteKind::Turret, "Gun", 5.0).with_power_draw(2.0)).unwrap();
        let id = settlement.register(turret, &mut log);
        settlement
            .with_env(&mut log, |scheduler, env| scheduler.bind(id, gunner, env))
            .unwrap();

        let summary = settlement.run_tick(&mut log).unwrap();
        assert_eq!(summary.tick, 1);
        assert!((summary.regenerated - 2.0).abs() < 1e-9);
        assert!((summary.drawn - 2.0).abs() < 1e-9);
        assert!(summary.charge.abs() < 1e-9);
        assert_eq!(summary.report.progressed, vec![id]);
    }

    #[test]
    fn standing_request_is_served_during_tick() {
        let mut settlement = hamlet(PowerPool::fixed(0.0).unwrap());
        let mut log = EventLog::new();
        let farmer = settlement.hire("Farmer", 1.0);
        assert_eq!(settlement.request_work(farmer, &mut log).unwrap(), None);

        settlement.stock_mut().deposit(Resource::Seed, 1).unwrap();
        let field = Task::new(TaskSpec::new(SiteKind::Farm, "Field", 3.0).with_cost(Resource::Seed, 1)).unwrap();
        let field_id = field.id();
        // Registration serves the line immediately, so nothing is left for the tick.
        settlement.register(field, &mut log);
        assert_eq!(settlement.workers().bound_task(farmer), Some(field_id));

        let summary = settlement.run_tick(&mut log).unwrap();
        assert!(summary.assigned.is_empty());
        assert_eq!(summary.report.progressed, vec![field_id]);
    }

    #[test]
    fn dismiss_frees_the_task() {
        let mut settlement = hamlet(PowerPool::fixed(0.0).unwrap());
        let mut log = EventLog::new();
        let worker = settlement.hire("Ada", 1.0);
        let bed = settlement.register(Task::new(TaskSpec::new(SiteKind::Bed, "Cot", 8.0)).unwrap(), &mut log);
        settlement.request_work(worker, &mut log).unwrap();
        let state = settlement.dismiss(worker).unwrap();
        assert_eq!(state.name, "Ada");
        assert!(settlement.scheduler().get(bed).is_some_and(|w| w.bound_workers().is_empty()));
        assert_eq!(settlement.tooltips(), vec![(bed, "Resting: Cot (0%)".to_owned())]);
    }
}
