//! Shared type definitions for the Colony work scheduler.
//!
//! Every crate in the workspace speaks in these types: identifiers,
//! resources, site kinds, lifecycle phases, and the persisted snapshot
//! shapes.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for tasks, workers, and sites
//! - [`enums`] -- Resources, site kinds, task phases, eviction reasons
//! - [`structs`] -- Resource costs, work orders, and save-file snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EvictionReason, Resource, SiteKind, TaskPhase};
pub use ids::{SiteId, TaskId, WorkerId};
pub use structs::{QueueSnapshot, ResourceCost, TaskSnapshot, WorkOrder};
