//! Crew speed aggregation.
//!
//! Several workers on one task do not simply add up:
//!
//! ```text
//! 0 workers  -> 0
//! 1 worker   -> speed
//! N workers  -> sqrt(N) * (sum(speed) / N)
//! ```
//!
//! For a fixed per-worker speed `s` this grows like `sqrt(N) * s`: strictly
//! less than `N * s` for every `N > 1`, and never decreasing as the crew
//! grows. An incapacitated worker (speed `<= 0`) still counts toward `N`
//! but contributes nothing to the sum, so one starving worker slows a crew
//! without stopping it. A lone incapacitated worker yields 0 and the task
//! pauses.

use colony_types::WorkerId;

use crate::worker::WorkerRoster;

/// Speed a single worker actually contributes: negative and non-finite
/// values count as zero.
fn effective_speed(speed: f64) -> f64 {
    if speed.is_finite() { speed.max(0.0) } else { 0.0 }
}

/// Combine per-worker speed multipliers into one progress rate.
pub fn aggregate_speed(speeds: &[f64]) -> f64 {
    match speeds {
        [] => 0.0,
        [single] => effective_speed(*single),
        crew => {
            let n = f64::from(u32::try_from(crew.len()).unwrap_or(u32::MAX));
            let sum: f64 = crew.iter().copied().map(effective_speed).sum();
            n.sqrt() * (sum / n)
        }
    }
}

/// Aggregate speed of the given workers as recorded on the roster.
///
/// Workers missing from the roster contribute 0 but still count.
pub fn crew_speed(workers: &[WorkerId], roster: &WorkerRoster) -> f64 {
    let speeds: Vec<f64> = workers
        .iter()
        .map(|id| roster.speed(*id).unwrap_or(0.0))
        .collect();
    aggregate_speed(&speeds)
}
