//! Shared collaborators for the Colony work scheduler.
//!
//! The scheduler never owns the settlement's resources or its power supply;
//! it reaches them through two narrow interfaces defined here, both of which
//! expose only atomic check-and-consume operations.
//!
//! # Modules
//!
//! - [`stockpile`] -- [`ResourceLedger`] trait and the [`Stockpile`] stacks.
//! - [`power`] -- [`PowerGrid`] trait and the regenerating [`PowerPool`].
//! - [`audit`] -- Per-tick power conservation audit.
//! - [`error`] -- Error types for stockpile and power operations.

pub mod audit;
pub mod error;
pub mod power;
pub mod stockpile;

// Re-export primary types at crate root.
pub use audit::{AuditResult, POWER_EPSILON, PowerAnomaly, PowerAudit};
pub use error::WorldError;
pub use power::{PowerGrid, PowerPool};
pub use stockpile::{ResourceLedger, Stockpile};
