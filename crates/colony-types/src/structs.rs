//! Plain data structs shared across the workspace.
//!
//! These carry no behaviour beyond construction helpers. The snapshot types
//! are the complete persisted surface of the scheduler: a save system stores
//! exactly these fields and nothing else.

use serde::{Deserialize, Serialize};

use crate::enums::Resource;
use crate::ids::WorkerId;

/// A quantity of one resource, paid once at the start of a work cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceCost {
    /// The resource consumed.
    pub resource: Resource,
    /// How many units are consumed.
    pub quantity: u32,
}

impl ResourceCost {
    /// Create a cost of `quantity` units of `resource`.
    pub const fn new(resource: Resource, quantity: u32) -> Self {
        Self { resource, quantity }
    }
}

/// One queued unit of repeatable work: a recipe, an upgrade, a research item.
///
/// Orders come from outside the engine (UI, save files, scripted events) so
/// every field may be missing or malformed; the task queue validates an order
/// before it drives a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Display name ("Stew", "Turret Mk II").
    pub label: String,
    /// Work-seconds required at aggregate speed 1.0.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Resources consumed when this order starts.
    #[serde(default)]
    pub cost: Vec<ResourceCost>,
}

impl WorkOrder {
    /// Create an order with a label, a duration, and no resource cost.
    pub fn new(label: &str, duration: f64) -> Self {
        Self {
            label: label.to_owned(),
            duration: Some(duration),
            cost: Vec::new(),
        }
    }

    /// Builder-style helper adding a resource cost to this order.
    #[must_use]
    pub fn with_cost(mut self, resource: Resource, quantity: u32) -> Self {
        self.cost.push(ResourceCost::new(resource, quantity));
        self
    }
}

/// Persisted per-task state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Elapsed work-seconds.
    pub progress: f64,
    /// Whether the task may progress.
    pub operational: bool,
    /// Workers bound at save time, in binding order.
    pub bound_workers: Vec<WorkerId>,
}

/// Persisted state of a task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// The order currently driving the task.
    pub current: Option<WorkOrder>,
    /// Orders waiting behind it, front first.
    pub pending: Vec<WorkOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_order_builder_collects_costs() {
        let order = WorkOrder::new("Stew", 4.0)
            .with_cost(Resource::RawFood, 2)
            .with_cost(Resource::Wood, 1);
        assert_eq!(order.cost.len(), 2);
        assert_eq!(order.cost.first().map(|c| c.quantity), Some(2));
    }

    #[test]
    fn work_order_missing_fields_deserialize_as_none() {
        let order: Result<WorkOrder, _> = serde_json::from_str(r#"{"label":"Broken"}"#);
        let order = order.ok();
        assert!(order.is_some());
        assert!(order.as_ref().and_then(|o| o.duration).is_none());
        assert!(order.is_some_and(|o| o.cost.is_empty()));
    }

    #[test]
    fn queue_snapshot_survives_json() {
        let snapshot = QueueSnapshot {
            current: Some(WorkOrder::new("Bread", 3.0)),
            pending: vec![WorkOrder::new("Soup", 5.0)],
        };
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        let restored: Option<QueueSnapshot> = serde_json::from_str(&json).ok();
        assert_eq!(restored, Some(snapshot));
    }
}
