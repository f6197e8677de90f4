#![warn(missing_docs)]
//! Overflow allocation primitives: item stacks, container snapshots, the
//! space calculator and the batch projection engine.
//!
//! Everything here is pure. Callers hand in borrowed snapshots and get a
//! decision back; moving items is left to the router crate.

pub mod container;
pub mod item;
pub mod projection;
pub mod space;

// Re-export commonly used types
pub use container::{ContainerError, ContainerSnapshot};
pub use item::{ItemId, ItemStack};
pub use projection::{project_batch, Projection, SpaceLedger};
pub use space::{evaluate, has_space, storage_full, OverflowDecision};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-player identity used for preferences and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler tick; deferred work runs on the tick after it was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}
