//! Starting workforce.
//!
//! Workers get names from a fixed pool and a speed multiplier rolled from a
//! seeded RNG, so the same `world.seed` always founds the same crew.

use anyhow::{bail, Result};
use colony_core::Settlement;
use colony_core::config::WorkforceConfig;
use colony_types::WorkerId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Names handed out in order. Reused with a numeric suffix once exhausted.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Hazel", "Iris", "Juniper",
    "Kestrel", "Lark",
];

/// Hire `config.initial_workers` workers into the settlement.
///
/// # Errors
///
/// Fails if the speed bounds are not finite, negative, or reversed.
pub fn hire_workforce(settlement: &mut Settlement, config: &WorkforceConfig, seed: u64) -> Result<Vec<WorkerId>> {
    let (min, max) = (config.min_speed, config.max_speed);
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        bail!("invalid workforce speed range [{min}, {max}]");
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut hired = Vec::new();
    let count = usize::try_from(config.initial_workers).unwrap_or(usize::MAX);
    for (round, base) in NAME_POOL.iter().cycle().take(count).enumerate() {
        let lap = round.checked_div(NAME_POOL.len()).unwrap_or(0);
        let name = if lap == 0 {
            (*base).to_owned()
        } else {
            format!("{base} {}", lap.saturating_add(1))
        };
        let speed = rng.random_range(min..=max);
        hired.push(settlement.hire(&name, speed));
    }

    info!(workers = hired.len(), seed, "Workforce hired");
    Ok(hired)
}
