//! Demo binary for the Colony simulation.
//!
//! Founds a small settlement and runs it for a bounded number of ticks,
//! logging assignments, completions, starvation, and periodic summaries.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `colony-config.yaml` (or `COLONY_CONFIG`)
//! 2. Initialize structured logging (tracing), as text or JSON lines
//! 3. Found the settlement: clock, power pool, stockpile
//! 4. Hire the starting workforce with seeded speed rolls
//! 5. Register the demo sites and send every worker looking for work
//! 6. Run the tick loop until `time.max_ticks`
//! 7. Log the result

mod layout;
mod observer;
mod workforce;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colony_core::{LogFormat, Settlement, SimulationConfig};
use colony_types::Resource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::layout::Sites;
use crate::observer::LoggingObserver;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "COLONY_CONFIG";

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "colony-config.yaml";

/// Ticks between new dirt patches on the cleaning rota.
const DIRT_INTERVAL_TICKS: u64 = 40;

/// What one barley harvest delivers.
const HARVEST: &[(Resource, u32)] = &[(Resource::RawFood, 4), (Resource::Seed, 1)];

fn main() -> Result<()> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init(),
    }

    info!("colony-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Found the settlement.
    let mut settlement = Settlement::from_config(&config).context("failed to found settlement")?;

    // 4. Hire the workforce.
    let crew = workforce::hire_workforce(&mut settlement, &config.workforce, config.world.seed)?;

    // 5. Register sites and hand out work.
    let mut observer = LoggingObserver::new();
    let sites = layout::found(&mut settlement, &mut observer)?;
    for worker in crew {
        settlement.request_work(worker, &mut observer)?;
    }

    // 6. Run.
    run(&mut settlement, &sites, &config, &mut observer)?;

    // 7. Log results.
    info!(
        ticks = settlement.clock().tick(),
        days = settlement.clock().day(),
        completions = observer.completions(),
        charge = settlement.power().charge(),
        stock = ?settlement.stock().stacks(),
        "colony-engine shutdown complete"
    );
    Ok(())
}

/// The bounded tick loop.
fn run(settlement: &mut Settlement, sites: &Sites, config: &SimulationConfig, observer: &mut LoggingObserver) -> Result<()> {
    let interval = config.logging.summary_interval_ticks.max(1);
    let mut dirt_round: usize = 0;

    for _ in 0..config.time.max_ticks {
        layout::restock_kitchen(settlement, sites.kitchen, observer)?;
        if settlement.clock().tick().checked_rem(DIRT_INTERVAL_TICKS) == Some(0) {
            layout::spread_dirt(settlement, sites.cleaning, dirt_round, observer)?;
            dirt_round = dirt_round.saturating_add(1);
        }

        let summary = settlement.run_tick(observer)?;

        if summary.report.completed.contains(&sites.field) {
            for &(resource, quantity) in HARVEST {
                if let Err(e) = settlement.stock_mut().deposit(resource, quantity) {
                    warn!(error = %e, "Harvest spoiled");
                }
            }
            settlement.with_env(observer, |scheduler, env| scheduler.offer(sites.field, env))?;
        }
        for task in &summary.report.starved {
            warn!(task = %task, charge = summary.charge, "Task starved of power");
        }
        layout::restore_power(settlement, sites.turret, observer)?;

        for worker in observer.take_released() {
            if settlement.workers().is_idle(worker) {
                settlement.request_work(worker, observer)?;
            }
        }

        if summary.tick.checked_rem(interval) == Some(0) {
            log_summary(settlement, summary.drawn);
        }
    }
    Ok(())
}

fn log_summary(settlement: &Settlement, drawn: f64) {
    let scheduler = settlement.scheduler();
    info!(
        tick = settlement.clock().tick(),
        day = settlement.clock().day(),
        charge = settlement.power().charge(),
        drawn,
        tasks = scheduler.len(),
        idle = settlement.workers().idle_workers().len(),
        waiting = scheduler.waiting().count(),
        "Settlement summary"
    );
    for (task, tooltip) in settlement.tooltips() {
        info!(task = %task, "{tooltip}");
    }
}

/// Load configuration from `COLONY_CONFIG`, or `colony-config.yaml` in the
/// working directory. Falls back to defaults when the file is absent.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>)> {
    let path = std::env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulationConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, None))
    }
}
