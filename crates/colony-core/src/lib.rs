//! Simulation clock, configuration, and settlement orchestration for the
//! Colony simulation.
//!
//! This crate owns the tick that drives a settlement: it advances the
//! clock, regenerates and audits the shared power pool, and hands the
//! scheduler its environment for the tick.
//!
//! # Modules
//!
//! - [`clock`] -- Fixed-step simulation clock with day tracking.
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`settlement`] -- The [`Settlement`] aggregate and its tick.
//!
//! [`Settlement`]: settlement::Settlement

pub mod clock;
pub mod config;
pub mod settlement;

pub use clock::{ClockError, SimClock};
pub use config::{ConfigError, LogFormat, SimulationConfig};
pub use settlement::{Settlement, TickError, TickSummary};
