#![warn(missing_docs)]
//! Overflow router: intercepts item events and sends what primary storage
//! cannot hold into the player's backpack.
//!
//! The router is wired to its collaborators at construction time. The
//! [`sandbox`] substrate backs the scenario runner and the tests.

pub mod config;
pub mod events;
pub mod permission;
pub mod preferences;
pub mod queue;
mod router;
pub mod sandbox;
pub mod substrate;

pub use config::{OverflowConfig, CONFIG_VERSION};
pub use events::{BatchSource, HookKind, HookResponse, OverflowEvent};
pub use permission::{Permissions, USE_PERMISSION};
pub use preferences::{
    JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences, StoreError,
    DEFAULT_ENABLED,
};
pub use queue::{DeferredMove, TaskQueue};
pub use router::{OverflowRouter, RejectReason, RouteError, RouteOutcome};
pub use sandbox::{ItemLocation, PlayerInventory, SandboxInventory, BELT_SLOTS, MAIN_SLOTS};
pub use substrate::{
    InventorySubstrate, ItemHandle, NotificationSink, NotifyError, NullNotifier, PermissionGate,
    SourceId,
};
