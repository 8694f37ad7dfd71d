//! Simulation clock.
//!
//! The clock advances once per settlement tick by a fixed `dt` of simulated
//! seconds. The tick counter is the source of truth; elapsed time and the
//! day number are derived from it.

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration.
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Fixed-step simulation clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Completed ticks.
    tick: u64,
    /// Simulated seconds per tick.
    dt: f64,
    /// Ticks in one in-game day.
    ticks_per_day: u64,
}

impl SimClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for a non-positive or
    /// non-finite tick length, or zero ticks per day.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.tick_seconds, config.ticks_per_day)
    }

    /// Create a clock from explicit parameters (tests, save restoration).
    ///
    /// # Errors
    ///
    /// See [`SimClock::new`].
    pub fn from_parts(tick: u64, dt: f64, ticks_per_day: u64) -> Result<Self, ClockError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("tick_seconds must be positive, got {dt}"),
            });
        }
        if ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            dt,
            ticks_per_day,
        })
    }

    /// Advance one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds per tick.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Simulated seconds since tick 0. Saturates past `u32::MAX` ticks.
    pub fn elapsed(&self) -> f64 {
        f64::from(u32::try_from(self.tick).unwrap_or(u32::MAX)) * self.dt
    }

    /// Current in-game day, starting at 0.
    pub fn day(&self) -> u64 {
        self.tick.checked_div(self.ticks_per_day).unwrap_or(0)
    }

    /// Ticks since the current day began.
    pub fn tick_within_day(&self) -> u64 {
        self.tick.checked_rem(self.ticks_per_day).unwrap_or(0)
    }
}
