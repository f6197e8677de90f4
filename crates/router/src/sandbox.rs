//! In-memory inventory substrate.
//!
//! Backs the scenario runner and the tests. Items live either loose in the
//! world (or in some container) under an [`ItemHandle`], or merged into a
//! player's containers, at which point their handle is retired.

use crate::substrate::{InventorySubstrate, ItemHandle, SourceId};
use overflow_core::{ContainerSnapshot, ItemStack, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Slots in a player's main inventory.
pub const MAIN_SLOTS: usize = 24;

/// Slots in a player's belt.
pub const BELT_SLOTS: usize = 6;

/// Where a loose item currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLocation {
    /// On the ground, in a dispenser, or freshly created.
    World,
    /// In a container that does not belong to any player.
    Foreign,
    /// In one of this player's containers.
    Player(PlayerId),
}

/// A player's containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInventory {
    /// Main inventory.
    pub main: ContainerSnapshot,
    /// Belt.
    pub belt: ContainerSnapshot,
    /// Backpack contents, if the player wears one.
    #[serde(default)]
    pub backpack: Option<ContainerSnapshot>,
}

impl PlayerInventory {
    /// Empty main and belt, no backpack.
    pub fn new() -> Self {
        Self {
            main: ContainerSnapshot::new(MAIN_SLOTS),
            belt: ContainerSnapshot::new(BELT_SLOTS),
            backpack: None,
        }
    }

    /// Same inventory wearing a backpack.
    pub fn with_backpack(mut self, backpack: ContainerSnapshot) -> Self {
        self.backpack = Some(backpack);
        self
    }
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct PlayerState {
    inventory: PlayerInventory,
    connected: bool,
}

#[derive(Debug, Clone)]
struct LooseItem {
    stack: ItemStack,
    location: ItemLocation,
}

/// Deterministic in-memory substrate.
#[derive(Debug, Clone, Default)]
pub struct SandboxInventory {
    players: HashMap<PlayerId, PlayerState>,
    items: BTreeMap<ItemHandle, LooseItem>,
    next_handle: u64,
    destroyed_sources: Vec<SourceId>,
    declined_moves: u32,
}

impl SandboxInventory {
    /// Create an empty sandbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a connected player.
    pub fn add_player(&mut self, player: PlayerId, inventory: PlayerInventory) {
        self.players.insert(
            player,
            PlayerState {
                inventory,
                connected: true,
            },
        );
    }

    /// Mark a player as gone; their inventory stays readable.
    pub fn disconnect(&mut self, player: PlayerId) {
        if let Some(state) = self.players.get_mut(&player) {
            state.connected = false;
        }
    }

    /// Take the backpack off a player.
    pub fn remove_backpack(&mut self, player: PlayerId) -> Option<ContainerSnapshot> {
        self.players
            .get_mut(&player)
            .and_then(|state| state.inventory.backpack.take())
    }

    /// A player's containers.
    pub fn inventory(&self, player: PlayerId) -> Option<&PlayerInventory> {
        self.players.get(&player).map(|state| &state.inventory)
    }

    /// Create a loose item.
    pub fn spawn_item(&mut self, stack: ItemStack, location: ItemLocation) -> ItemHandle {
        self.next_handle += 1;
        let handle = ItemHandle(self.next_handle);
        self.items.insert(handle, LooseItem { stack, location });
        handle
    }

    /// Delete a loose item, as if the engine destroyed it.
    pub fn remove_item(&mut self, item: ItemHandle) -> Option<ItemStack> {
        self.items.remove(&item).map(|loose| loose.stack)
    }

    /// Number of loose items still alive.
    pub fn loose_items(&self) -> usize {
        self.items.len()
    }

    /// Sources consumed so far, in order.
    pub fn destroyed_sources(&self) -> &[SourceId] {
        &self.destroyed_sources
    }

    /// Make the next `count` backpack moves fail regardless of space.
    pub fn decline_next_moves(&mut self, count: u32) {
        self.declined_moves = count;
    }
}

impl InventorySubstrate for SandboxInventory {
    fn is_connected(&self, player: PlayerId) -> bool {
        self.players.get(&player).is_some_and(|state| state.connected)
    }

    fn primary_containers(&self, player: PlayerId) -> Option<Vec<&ContainerSnapshot>> {
        self.players
            .get(&player)
            .map(|state| vec![&state.inventory.main, &state.inventory.belt])
    }

    fn backpack(&self, player: PlayerId) -> Option<&ContainerSnapshot> {
        self.players
            .get(&player)
            .and_then(|state| state.inventory.backpack.as_ref())
    }

    fn item(&self, item: ItemHandle) -> Option<&ItemStack> {
        self.items.get(&item).map(|loose| &loose.stack)
    }

    fn in_player_inventory(&self, player: PlayerId, item: ItemHandle) -> bool {
        self.items
            .get(&item)
            .is_some_and(|loose| loose.location == ItemLocation::Player(player))
    }

    fn materialize(&mut self, stack: &ItemStack) -> Option<ItemHandle> {
        if !stack.is_valid() {
            return None;
        }
        Some(self.spawn_item(stack.clone(), ItemLocation::World))
    }

    fn discard(&mut self, item: ItemHandle) {
        self.items.remove(&item);
    }

    fn move_to_backpack(&mut self, player: PlayerId, item: ItemHandle) -> bool {
        if self.declined_moves > 0 {
            self.declined_moves -= 1;
            return false;
        }
        let Some(loose) = self.items.get(&item) else {
            return false;
        };
        let Some(backpack) = self
            .players
            .get_mut(&player)
            .and_then(|state| state.inventory.backpack.as_mut())
        else {
            return false;
        };

        if backpack.insert_stacking(loose.stack.clone()).is_err() {
            return false;
        }
        self.items.remove(&item);
        true
    }

    fn destroy_source(&mut self, source: SourceId) {
        self.destroyed_sources.push(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overflow_core::ItemId;

    #[test]
    fn move_merges_and_retires_the_handle() {
        let mut sandbox = SandboxInventory::new();
        let player = PlayerId(1);
        sandbox.add_player(player, PlayerInventory::new().with_backpack(ContainerSnapshot::new(4)));
        let item = sandbox.spawn_item(ItemStack::new(ItemId(3), 10, 64), ItemLocation::World);

        assert!(sandbox.move_to_backpack(player, item));
        assert!(sandbox.item(item).is_none());
        assert_eq!(sandbox.backpack(player).unwrap().count_item(ItemId(3)), 10);
    }

    #[test]
    fn declined_moves_leave_the_item() {
        let mut sandbox = SandboxInventory::new();
        let player = PlayerId(1);
        sandbox.add_player(player, PlayerInventory::new().with_backpack(ContainerSnapshot::new(4)));
        let item = sandbox.spawn_item(ItemStack::new(ItemId(3), 10, 64), ItemLocation::World);

        sandbox.decline_next_moves(1);
        assert!(!sandbox.move_to_backpack(player, item));
        assert!(sandbox.item(item).is_some());
        assert!(sandbox.move_to_backpack(player, item));
    }

    #[test]
    fn disconnect_keeps_inventory() {
        let mut sandbox = SandboxInventory::new();
        sandbox.add_player(PlayerId(2), PlayerInventory::new());
        sandbox.disconnect(PlayerId(2));

        assert!(!sandbox.is_connected(PlayerId(2)));
        assert!(sandbox.primary_containers(PlayerId(2)).is_some());
    }
}
