//! Error types for the `colony-world` crate.

use colony_types::Resource;

/// Errors that can occur while mutating the stockpile or the power pool.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,

    /// Depositing would push a stack beyond its storage limit.
    #[error("stockpile full: adding {attempted} {resource:?} exceeds the limit of {limit}")]
    StockpileFull {
        /// The resource being deposited.
        resource: Resource,
        /// Units the caller tried to add.
        attempted: u32,
        /// Per-resource storage limit.
        limit: u32,
    },

    /// A power quantity was negative, NaN, or infinite.
    #[error("invalid power amount: {0}")]
    InvalidPowerAmount(f64),
}
