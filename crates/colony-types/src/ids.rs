//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Tasks, workers, and the sites that own tasks each get a distinct newtype
//! so a `WorkerId` can never be passed where a `TaskId` is expected. All IDs
//! use UUID v7 (time-ordered).
//!
//! Ordering of IDs is never used for scheduling decisions; the scheduler
//! keeps its own registration order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a schedulable task. Stable for the task's lifetime.
    TaskId
}

define_id! {
    /// Unique identifier for a worker (any agent able to contribute work).
    WorkerId
}

define_id! {
    /// Unique identifier for the physical site (farm, kitchen, bed, turret)
    /// that owns one or more tasks.
    SiteId
}
