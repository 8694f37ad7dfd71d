//! The demo settlement's sites and the chores that keep appearing on them.

use anyhow::{Context, Result};
use colony_core::Settlement;
use colony_types::{Resource, SiteKind, TaskId, TaskPhase, WorkOrder, WorkerId};
use colony_work::{CompositeTask, Task, TaskQueue, TaskSpec, Work, WorkObserver};
use colony_world::PowerGrid;
use tracing::info;

/// Ids of the registered demo sites.
#[derive(Debug, Clone, Copy)]
pub struct Sites {
    /// Barley field; each harvest feeds the kitchen.
    pub field: TaskId,
    /// Kitchen queue.
    pub kitchen: TaskId,
    /// Power-hungry turret.
    pub turret: TaskId,
    /// Cleaning rota with dirt patches as children.
    pub cleaning: TaskId,
}

/// Dirt patches that turn up around the settlement, in order.
const DIRT: &[(&str, f64)] = &[
    ("Mud by the gate", 4.0),
    ("Ash around the hearth", 3.0),
    ("Straw in the barn", 5.0),
];

/// Register every demo site and fill the kitchen's first orders.
///
/// # Errors
///
/// Fails if a site spec or order is invalid.
pub fn found(settlement: &mut Settlement, observer: &mut dyn WorkObserver) -> Result<Sites> {
    let field = Task::new(
        TaskSpec::new(SiteKind::Farm, "Barley field", 12.0)
            .with_capacity(2)
            .with_cost(Resource::Seed, 1),
    )?;
    let field = settlement.register(field, observer);

    let kitchen = settlement.register(TaskQueue::new(TaskSpec::new(SiteKind::Kitchen, "Hearth", 1.0))?, observer);
    settlement
        .with_env(observer, |scheduler, env| {
            scheduler.enqueue_order(kitchen, WorkOrder::new("Stew", 8.0).with_cost(Resource::RawFood, 2), env)?;
            scheduler.enqueue_order(kitchen, WorkOrder::new("Bread", 5.0).with_cost(Resource::RawFood, 1), env)?;
            scheduler.enqueue_order(kitchen, WorkOrder::new("Stew", 8.0).with_cost(Resource::RawFood, 2), env)
        })
        .context("failed to queue the first meals")?;

    let turret = settlement.register(
        Task::new(TaskSpec::new(SiteKind::Turret, "North wall", 20.0).with_power_draw(1.0))?,
        observer,
    );
    let cleaning = settlement.register(CompositeTask::new(TaskSpec::new(SiteKind::Cleaning, "Sweeping", 30.0))?, observer);
    let palisade = Task::new(
        TaskSpec::new(SiteKind::Construction, "Palisade", 40.0)
            .with_capacity(3)
            .with_cost(Resource::Wood, 10)
            .one_shot(),
    )?;
    settlement.register(palisade, observer);
    settlement.register(Task::new(TaskSpec::new(SiteKind::Bed, "Cot", 16.0))?, observer);

    info!(tasks = settlement.scheduler().len(), "Sites registered");
    Ok(Sites {
        field,
        kitchen,
        turret,
        cleaning,
    })
}

/// If the cleaning rota has no active patch, install the next one and hand
/// it to whoever is sweeping.
///
/// # Errors
///
/// Fails if the patch cannot be created or the sweeper cannot be moved.
pub fn spread_dirt(
    settlement: &mut Settlement,
    cleaning: TaskId,
    round: usize,
    observer: &mut dyn WorkObserver,
) -> Result<()> {
    let Some(Work::Composite(rota)) = settlement.scheduler().get(cleaning) else {
        return Ok(());
    };
    if rota.child().is_some() {
        return Ok(());
    }
    let sweeper = rota
        .base()
        .bound_workers()
        .first()
        .copied()
        .or_else(|| settlement.scheduler().recall(cleaning));
    let sweeper = sweeper.filter(|w| {
        settlement
            .workers()
            .bound_task(*w)
            .is_none_or(|t| t == cleaning)
    });

    let Some(&(label, duration)) = DIRT.get(round.checked_rem(DIRT.len()).unwrap_or(0)) else {
        return Ok(());
    };
    let patch = Task::new(TaskSpec::new(SiteKind::Cleaning, label, duration).one_shot())?;
    settlement
        .with_env(observer, |scheduler, env| {
            scheduler.set_active_child(cleaning, patch, sweeper, env)
        })
        .with_context(|| format!("failed to assign dirt patch {label}"))
}

/// Put the kitchen back to work when its orders run out.
///
/// # Errors
///
/// Fails if the order is rejected.
pub fn restock_kitchen(settlement: &mut Settlement, kitchen: TaskId, observer: &mut dyn WorkObserver) -> Result<()> {
    let Some(Work::Queue(queue)) = settlement.scheduler().get(kitchen) else {
        return Ok(());
    };
    if queue.current().is_some() {
        return Ok(());
    }
    settlement
        .with_env(observer, |scheduler, env| {
            scheduler.enqueue_order(kitchen, WorkOrder::new("Stew", 8.0).with_cost(Resource::RawFood, 2), env)
        })
        .context("failed to queue stew")
}

/// Bring a starved turret back online once the pool can cover the rest of
/// its cycle. Returns the worker reinstated, if any.
///
/// # Errors
///
/// Fails if the turret is no longer registered.
pub fn restore_power(
    settlement: &mut Settlement,
    turret: TaskId,
    observer: &mut dyn WorkObserver,
) -> Result<Option<WorkerId>> {
    let Some(work) = settlement.scheduler().get(turret) else {
        return Ok(None);
    };
    if work.phase() != TaskPhase::Suspended {
        return Ok(None);
    }
    let task = work.task();
    let needed = task.power_draw() * (task.duration() - task.progress()).max(0.0);
    if !settlement.power().has_capacity(needed) {
        return Ok(None);
    }
    let back = settlement
        .with_env(observer, |scheduler, env| scheduler.set_operational(turret, true, env))
        .context("turret vanished while restoring power")?;
    info!(task = %turret, worker = ?back, charge = settlement.power().charge(), "Power restored");
    Ok(back)
}
