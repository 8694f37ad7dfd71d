//! Countable resource stacks and the [`ResourceLedger`] interface.
//!
//! Tasks only ever see the trait. [`Stockpile`] is the reference
//! implementation used by the settlement and by tests; a host game may plug
//! in its own inventory system instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use colony_types::{Resource, ResourceCost};

use crate::error::WorldError;

/// Interface to the settlement's countable resources.
///
/// Every consuming call is a single check-and-consume so no other task can
/// observe the same units between the check and the deduction.
pub trait ResourceLedger {
    /// Whether at least `quantity` units of `resource` are held.
    fn has(&self, resource: Resource, quantity: u32) -> bool;

    /// Remove `quantity` units of `resource`. Returns `false` and leaves the
    /// ledger untouched if not enough units are held.
    fn consume(&mut self, resource: Resource, quantity: u32) -> bool;

    /// Whether every cost in `costs` can be paid at once.
    ///
    /// Costs naming the same resource twice are summed.
    fn has_all(&self, costs: &[ResourceCost]) -> bool {
        merge_costs(costs)
            .is_some_and(|merged| merged.iter().all(|(&r, &q)| self.has(r, q)))
    }

    /// Pay every cost in `costs`, or none of them.
    fn consume_all(&mut self, costs: &[ResourceCost]) -> bool {
        let Some(merged) = merge_costs(costs) else {
            return false;
        };
        if !merged.iter().all(|(&r, &q)| self.has(r, q)) {
            return false;
        }
        merged.iter().all(|(&r, &q)| self.consume(r, q))
    }
}

/// Sum costs per resource. Returns `None` on overflow.
fn merge_costs(costs: &[ResourceCost]) -> Option<BTreeMap<Resource, u32>> {
    let mut merged: BTreeMap<Resource, u32> = BTreeMap::new();
    for cost in costs {
        let entry = merged.entry(cost.resource).or_insert(0);
        *entry = entry.checked_add(cost.quantity)?;
    }
    Some(merged)
}

/// The settlement's shared resource stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    /// Units held per resource. Resources at zero are removed.
    stacks: BTreeMap<Resource, u32>,
    /// Optional per-resource storage limit.
    limit: Option<u32>,
}

impl Stockpile {
    /// Create an empty, unlimited stockpile.
    pub const fn new() -> Self {
        Self {
            stacks: BTreeMap::new(),
            limit: None,
        }
    }

    /// Create an empty stockpile that holds at most `limit` units of each
    /// resource.
    pub const fn with_limit(limit: u32) -> Self {
        Self {
            stacks: BTreeMap::new(),
            limit: Some(limit),
        }
    }

    /// Create a stockpile pre-filled from a resource map.
    pub fn from_stacks(stacks: BTreeMap<Resource, u32>) -> Self {
        let stacks = stacks.into_iter().filter(|&(_, q)| q > 0).collect();
        Self {
            stacks,
            limit: None,
        }
    }

    /// Add `quantity` units of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StockpileFull`] if the storage limit would be
    /// exceeded, or [`WorldError::ArithmeticOverflow`] on overflow.
    pub fn deposit(&mut self, resource: Resource, quantity: u32) -> Result<u32, WorldError> {
        if quantity == 0 {
            return Ok(self.quantity(resource));
        }
        let current = self.quantity(resource);
        let updated = current
            .checked_add(quantity)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if let Some(limit) = self.limit
            && updated > limit
        {
            return Err(WorldError::StockpileFull {
                resource,
                attempted: quantity,
                limit,
            });
        }
        self.stacks.insert(resource, updated);
        Ok(updated)
    }

    /// Units of `resource` currently held.
    pub fn quantity(&self, resource: Resource) -> u32 {
        self.stacks.get(&resource).copied().unwrap_or(0)
    }

    /// Read-only view of all stacks.
    pub const fn stacks(&self) -> &BTreeMap<Resource, u32> {
        &self.stacks
    }

    /// Total units across all resources (saturating).
    pub fn total(&self) -> u32 {
        self.stacks.values().fold(0_u32, |acc, &q| acc.saturating_add(q))
    }
}

impl ResourceLedger for Stockpile {
    fn has(&self, resource: Resource, quantity: u32) -> bool {
        self.quantity(resource) >= quantity
    }

    fn consume(&mut self, resource: Resource, quantity: u32) -> bool {
        if quantity == 0 {
            return true;
        }
        let Some(current) = self.stacks.get(&resource).copied() else {
            return false;
        };
        let Some(remaining) = current.checked_sub(quantity) else {
            return false;
        };
        if remaining == 0 {
            self.stacks.remove(&resource);
        } else {
            self.stacks.insert(resource, remaining);
        }
        debug!(?resource, quantity, remaining, "Stockpile consumed");
        true
    }
}
