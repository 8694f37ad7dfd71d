//! The shared power pool and the [`PowerGrid`] interface.
//!
//! Powered tasks (turrets, workshops, research desks) draw from one pool
//! every tick they are active. Draws are processed in task-registration
//! order by the scheduler, so under a shortage the earliest-registered tasks
//! are served first and later ones starve.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audit::{AuditResult, POWER_EPSILON, PowerAudit};
use crate::error::WorldError;

/// Interface to the settlement's shared power capacity.
pub trait PowerGrid {
    /// Whether the pool currently holds at least `amount` units.
    fn has_capacity(&self, amount: f64) -> bool;

    /// Atomically check and subtract `rate * dt` units.
    ///
    /// Returns `false` without drawing anything if the pool cannot cover
    /// the full amount.
    fn draw(&mut self, rate: f64, dt: f64) -> bool;
}

/// A single battery-like pool with optional regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerPool {
    /// Units currently stored.
    charge: f64,
    /// Maximum units the pool can hold.
    capacity: f64,
    /// Units regenerated per simulated second (generators, solar).
    regen_per_second: f64,
    /// Conservation audit for the current tick.
    audit: PowerAudit,
}

impl PowerPool {
    /// Create a pool.
    ///
    /// `charge` is clamped to `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidPowerAmount`] if any value is negative or
    /// not finite.
    pub fn new(capacity: f64, charge: f64, regen_per_second: f64) -> Result<Self, WorldError> {
        for value in [capacity, charge, regen_per_second] {
            validate_amount(value)?;
        }
        let charge = charge.min(capacity);
        Ok(Self {
            charge,
            capacity,
            regen_per_second,
            audit: PowerAudit::open(0, charge),
        })
    }

    /// A full pool of `capacity` units that never regenerates.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidPowerAmount`] for negative or non-finite
    /// capacities.
    pub fn fixed(capacity: f64) -> Result<Self, WorldError> {
        Self::new(capacity, capacity, 0.0)
    }

    /// Units currently stored.
    pub const fn charge(&self) -> f64 {
        self.charge
    }

    /// Maximum units the pool can hold.
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Regenerate for `dt` simulated seconds, capped at capacity.
    ///
    /// Returns the units actually added.
    pub fn regenerate(&mut self, dt: f64) -> f64 {
        if self.regen_per_second <= 0.0 || dt <= 0.0 || !dt.is_finite() {
            return 0.0;
        }
        let headroom = (self.capacity - self.charge).max(0.0);
        let added = (self.regen_per_second * dt).min(headroom);
        self.charge += added;
        added
    }

    /// Open the audit window for `tick`. Call after regeneration and before
    /// any task draws.
    pub const fn begin_tick(&mut self, tick: u64) {
        self.audit = PowerAudit::open(tick, self.charge);
    }

    /// The audit window for the current tick.
    pub const fn audit(&self) -> &PowerAudit {
        &self.audit
    }

    /// Verify that the current tick drew no more than it started with.
    pub fn verify_conservation(&self) -> AuditResult {
        let result = self.audit.verify();
        if let AuditResult::Overdraw(ref anomaly) = result {
            warn!(tick = anomaly.tick, drawn = anomaly.drawn, "{anomaly}");
        }
        result
    }
}

impl PowerGrid for PowerPool {
    fn has_capacity(&self, amount: f64) -> bool {
        amount.is_finite() && amount <= self.charge + POWER_EPSILON
    }

    fn draw(&mut self, rate: f64, dt: f64) -> bool {
        let amount = rate * dt;
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        if amount > self.charge + POWER_EPSILON {
            debug!(amount, charge = self.charge, "Power draw refused");
            return false;
        }
        self.charge = (self.charge - amount).max(0.0);
        self.audit.record(amount);
        true
    }
}

fn validate_amount(value: f64) -> Result<(), WorldError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WorldError::InvalidPowerAmount(value))
    }
}
