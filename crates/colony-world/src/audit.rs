//! Per-tick power conservation audit.
//!
//! The power pool records how much charge it held when the tick began and
//! every unit drawn afterwards. At the end of the tick the engine verifies:
//!
//! ```text
//! sum(draws in T) <= charge at start of T
//! ```
//!
//! Regeneration happens before the audit window opens, so it never masks an
//! overdraw. A violation produces a [`PowerAnomaly`]. The draw path checks
//! before it subtracts, so the audit holds by construction; it exists to
//! catch a broken `PowerGrid` implementation or a future regression.

use serde::{Deserialize, Serialize};

/// Tolerance for floating-point accumulation when comparing power totals.
pub const POWER_EPSILON: f64 = 1e-9;

/// Running totals for the current audit window (one tick).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerAudit {
    /// The tick this window belongs to.
    tick: u64,
    /// Charge available when the window opened.
    opening_charge: f64,
    /// Total charge drawn since the window opened.
    drawn: f64,
    /// Number of successful draws in this window.
    draws: u32,
}

/// A conservation violation: more power left the pool than it held.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerAnomaly {
    /// The tick where the anomaly was detected.
    pub tick: u64,
    /// Charge at the start of the tick.
    pub opening_charge: f64,
    /// Total drawn during the tick.
    pub drawn: f64,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for PowerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of verifying one audit window.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditResult {
    /// Draws stayed within the opening charge.
    Balanced,
    /// Draws exceeded the opening charge.
    Overdraw(PowerAnomaly),
}

impl PowerAudit {
    /// Open a new window for `tick` with the given opening charge.
    pub const fn open(tick: u64, opening_charge: f64) -> Self {
        Self {
            tick,
            opening_charge,
            drawn: 0.0,
            draws: 0,
        }
    }

    /// Record a successful draw.
    pub fn record(&mut self, amount: f64) {
        self.drawn += amount;
        self.draws = self.draws.saturating_add(1);
    }

    /// Total drawn in this window.
    pub const fn drawn(&self) -> f64 {
        self.drawn
    }

    /// Number of successful draws in this window.
    pub const fn draws(&self) -> u32 {
        self.draws
    }

    /// Charge held when the window opened.
    pub const fn opening_charge(&self) -> f64 {
        self.opening_charge
    }

    /// Verify the conservation law for this window.
    pub fn verify(&self) -> AuditResult {
        if self.drawn <= self.opening_charge + POWER_EPSILON {
            return AuditResult::Balanced;
        }
        AuditResult::Overdraw(PowerAnomaly {
            tick: self.tick,
            opening_charge: self.opening_charge,
            drawn: self.drawn,
            message: format!(
                "POWER_ANOMALY at tick {}: drew {:.6} from an opening charge of {:.6}",
                self.tick, self.drawn, self.opening_charge
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_is_balanced() {
        assert_eq!(PowerAudit::open(1, 0.0).verify(), AuditResult::Balanced);
    }

    #[test]
    fn draws_up_to_opening_charge_balance() {
        let mut audit = PowerAudit::open(3, 10.0);
        audit.record(4.0);
        audit.record(6.0);
        assert_eq!(audit.draws(), 2);
        assert_eq!(audit.verify(), AuditResult::Balanced);
    }

    #[test]
    fn overdraw_is_reported() {
        let mut audit = PowerAudit::open(7, 5.0);
        audit.record(3.0);
        audit.record(3.0);
        let result = audit.verify();
        assert!(matches!(
            &result,
            AuditResult::Overdraw(anomaly)
                if anomaly.tick == 7 && anomaly.message.contains("POWER_ANOMALY")
        ));
    }
}
