//! Containers, players and routers in known states.

use crate::fakes::RecordingNotifier;
use overflow_core::{ContainerSnapshot, ItemId, ItemStack, PlayerId};
use overflow_router::{
    MemoryPreferenceStore, NotificationSink, OverflowConfig, OverflowRouter, Permissions,
    PlayerInventory, SandboxInventory, BELT_SLOTS, MAIN_SLOTS,
};

/// Player every fixture is built around.
pub const PLAYER: PlayerId = PlayerId(76_561_198_000_000_001);

/// Item ids at or above this value are reserved for filler stacks.
pub const FILLER_BASE: u32 = 10_000;

/// Router over the sandbox with in-memory preferences.
pub type TestRouter<N = RecordingNotifier> =
    OverflowRouter<SandboxInventory, MemoryPreferenceStore, Permissions, N>;

/// Shorthand for a stack.
pub fn stack(id: u32, count: u32, max_stack_size: u32) -> ItemStack {
    ItemStack::new(ItemId(id), count, max_stack_size)
}

/// A container with `used` of its `capacity` slots holding full, unstackable filler.
pub fn filled(capacity: usize, used: usize) -> ContainerSnapshot {
    let entries = (0..used.min(capacity))
        .map(|i| stack(FILLER_BASE + i as u32, 1, 1))
        .collect();
    ContainerSnapshot::with_entries(capacity, entries).unwrap_or_else(|_| ContainerSnapshot::new(capacity))
}

/// A container holding exactly `entries`.
pub fn container(capacity: usize, entries: Vec<ItemStack>) -> ContainerSnapshot {
    ContainerSnapshot::with_entries(capacity, entries).unwrap_or_else(|_| ContainerSnapshot::new(capacity))
}

/// Main and belt completely full of filler.
pub fn full_primary() -> PlayerInventory {
    PlayerInventory {
        main: filled(MAIN_SLOTS, MAIN_SLOTS),
        belt: filled(BELT_SLOTS, BELT_SLOTS),
        backpack: None,
    }
}

/// Builds a [`TestRouter`] around [`PLAYER`].
#[derive(Debug, Clone)]
pub struct Harness {
    inventory: PlayerInventory,
    config: OverflowConfig,
    permissions: Permissions,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Full primary storage, empty 40-slot backpack, everyone permitted.
    pub fn new() -> Self {
        Self {
            inventory: full_primary().with_backpack(ContainerSnapshot::new(40)),
            config: OverflowConfig::default(),
            permissions: Permissions::allow_all(),
        }
    }

    /// Replace the player's containers.
    pub fn inventory(mut self, inventory: PlayerInventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Replace the backpack contents.
    pub fn backpack(mut self, backpack: ContainerSnapshot) -> Self {
        self.inventory.backpack = Some(backpack);
        self
    }

    /// Take the backpack away.
    pub fn without_backpack(mut self) -> Self {
        self.inventory.backpack = None;
        self
    }

    /// Replace the main inventory.
    pub fn main(mut self, main: ContainerSnapshot) -> Self {
        self.inventory.main = main;
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: OverflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the permission gate.
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Build with a [`RecordingNotifier`].
    pub fn build(self) -> TestRouter {
        self.build_with(RecordingNotifier::new())
    }

    /// Build with a custom notification sink.
    pub fn build_with<N: NotificationSink>(self, notifier: N) -> TestRouter<N> {
        let mut sandbox = SandboxInventory::new();
        sandbox.add_player(PLAYER, self.inventory);
        OverflowRouter::new(
            sandbox,
            MemoryPreferenceStore::new(),
            self.permissions,
            notifier,
            self.config,
        )
    }
}
