//! Enumeration types shared by the scheduler, the world crate, and the engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A countable resource held in the settlement stockpile.
///
/// Tasks pay their resource cost from the stockpile once at the start of each
/// work cycle (or each queued payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    // --- Raw ---
    /// Lumber for construction and fuel.
    Wood,
    /// Quarried stone.
    Stone,
    /// Smelted metal for upgrades and turrets.
    Metal,
    /// Seeds planted at farm sites.
    Seed,
    /// Raw food harvested from farms.
    RawFood,

    // --- Processed ---
    /// Meals cooked in kitchens.
    Meal,
    /// Herbal medicine.
    Medicine,
    /// Ammunition consumed by turrets.
    Ammunition,
    /// Parchment consumed by research.
    Parchment,
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// The kind of physical site a task belongs to.
///
/// Used for tooltips and structured logging only; the scheduler treats every
/// kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Crop field.
    Farm,
    /// Cooking station.
    Kitchen,
    /// Sleeping spot.
    Bed,
    /// Powered defensive turret.
    Turret,
    /// Building under construction.
    Construction,
    /// Cleaning station managing dirt-removal jobs.
    Cleaning,
    /// Research desk.
    Research,
    /// Upgrade and crafting bench.
    Workshop,
}

impl SiteKind {
    /// Verb used when describing work at this site ("Farming", "Cooking").
    pub const fn activity(self) -> &'static str {
        match self {
            Self::Farm => "Farming",
            Self::Kitchen => "Cooking",
            Self::Bed => "Resting",
            Self::Turret => "Guarding",
            Self::Construction => "Building",
            Self::Cleaning => "Cleaning",
            Self::Research => "Researching",
            Self::Workshop => "Upgrading",
        }
    }
}

// ---------------------------------------------------------------------------
// Task lifecycle
// ---------------------------------------------------------------------------

/// Observable lifecycle phase of a task.
///
/// The phase is always derived from task fields, never stored, so it cannot
/// drift from the binding list or the operational flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// No workers bound; ready to accept one.
    Idle,
    /// At least one worker bound and progress advancing.
    Active,
    /// Not operational (power starvation or administrative suspend).
    Suspended,
    /// One-shot task that has finished; awaiting reclamation by its owner.
    Completed,
}

/// Why a worker was removed from a task.
///
/// Delivered to the worker's `on_evicted` callback so the consumer can pick
/// an idle behaviour (take a break, look for other work, go to bed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// The task finished its work.
    Completed,
    /// The task was administratively suspended.
    Suspended,
    /// The shared power pool could not cover the task's draw.
    PowerStarved,
    /// The crew's aggregate speed dropped to zero (e.g. a starving worker).
    Exhausted,
    /// The next queued payload could not pay its resource cost.
    InsufficientResources,
    /// The owning site was destroyed.
    SiteDestroyed,
    /// A composite site replaced its active child task.
    Replaced,
}
