//! Collaborators the router is wired to.
//!
//! The router never touches containers directly: it reads snapshots through
//! [`InventorySubstrate`] and asks it to perform every mutation.

use overflow_core::{ContainerSnapshot, ItemId, ItemStack, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Handle of a live item known to the substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub u64);

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a batch source such as a collectible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u64);

/// Container contents, item lookup and the move primitive.
pub trait InventorySubstrate {
    /// Whether the player is still present.
    fn is_connected(&self, player: PlayerId) -> bool;

    /// Primary storage of a player (main inventory and belt), or `None` for an unknown player.
    fn primary_containers(&self, player: PlayerId) -> Option<Vec<&ContainerSnapshot>>;

    /// The player's backpack contents, if they carry one.
    fn backpack(&self, player: PlayerId) -> Option<&ContainerSnapshot>;

    /// Stack carried by a live item.
    fn item(&self, item: ItemHandle) -> Option<&ItemStack>;

    /// Whether `item` currently sits in one of the player's own containers.
    fn in_player_inventory(&self, player: PlayerId, item: ItemHandle) -> bool;

    /// Create a detached stand-in item carrying `stack`.
    fn materialize(&mut self, stack: &ItemStack) -> Option<ItemHandle>;

    /// Destroy a detached item.
    fn discard(&mut self, item: ItemHandle);

    /// Move `item` into the player's backpack, stacking onto partial stacks.
    ///
    /// Returns false when the substrate declines the move; the item is then
    /// left where it was.
    fn move_to_backpack(&mut self, player: PlayerId, item: ItemHandle) -> bool;

    /// Mark a batch source as consumed.
    fn destroy_source(&mut self, source: SourceId);
}

/// Answers "may this player use overflow routing".
pub trait PermissionGate {
    /// Permission check for one player.
    fn may_use(&self, player: PlayerId) -> bool;
}

/// Notification delivery failed.
#[derive(Debug, Error)]
#[error("failed to notify player {player}: {reason}")]
pub struct NotifyError {
    /// Recipient.
    pub player: PlayerId,
    /// Human-readable cause.
    pub reason: String,
}

/// One-way sink for successful overflow moves.
pub trait NotificationSink {
    /// `amount` units of `item_id` went to the player's backpack.
    fn overflow_moved(
        &mut self,
        player: PlayerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<(), NotifyError>;
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn overflow_moved(&mut self, _: PlayerId, _: ItemId, _: u32) -> Result<(), NotifyError> {
        Ok(())
    }
}
