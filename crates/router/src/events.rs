//! Engine events the router may intercept.

use crate::substrate::{ItemHandle, SourceId};
use overflow_core::{ItemStack, PlayerId};
use serde::{Deserialize, Serialize};

/// Which hook an event belongs to; each maps to one config switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    /// Regular resource dispenser yield.
    Gather,
    /// Bonus yield handed out after the dispenser is depleted.
    GatherBonus,
    /// Multi-yield collectible picked up.
    CollectiblePickup,
    /// Dropped item picked up from the ground.
    ItemPickup,
    /// Item moved out of a container into the player's inventory.
    LootMove,
}

/// A batch of stacks arriving from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSource {
    /// Source consumed when the batch is routed.
    pub id: SourceId,
    /// Stacks the source yields, in yield order.
    pub yields: Vec<ItemStack>,
}

/// An intercepted engine event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverflowEvent {
    /// Dispenser yield about to be given. The router may route a duplicate.
    Gather {
        /// Receiving player.
        player: PlayerId,
        /// Item the engine is about to give.
        item: ItemHandle,
    },
    /// Bonus yield; routing is deferred to the next tick.
    GatherBonus {
        /// Receiving player.
        player: PlayerId,
        /// Item the engine is about to give.
        item: ItemHandle,
    },
    /// Collectible pickup, routed as a batch.
    CollectiblePickup {
        /// Receiving player.
        player: PlayerId,
        /// Collectible and its yields.
        source: BatchSource,
    },
    /// Ground item pickup.
    ItemPickup {
        /// Receiving player.
        player: PlayerId,
        /// Item being picked up.
        item: ItemHandle,
    },
    /// Item moved from some container toward the player.
    LootMove {
        /// Receiving player.
        player: PlayerId,
        /// Item being moved.
        item: ItemHandle,
    },
}

impl OverflowEvent {
    /// Hook this event belongs to.
    pub fn kind(&self) -> HookKind {
        match self {
            OverflowEvent::Gather { .. } => HookKind::Gather,
            OverflowEvent::GatherBonus { .. } => HookKind::GatherBonus,
            OverflowEvent::CollectiblePickup { .. } => HookKind::CollectiblePickup,
            OverflowEvent::ItemPickup { .. } => HookKind::ItemPickup,
            OverflowEvent::LootMove { .. } => HookKind::LootMove,
        }
    }

    /// Player the event concerns.
    pub fn player(&self) -> PlayerId {
        match self {
            OverflowEvent::Gather { player, .. }
            | OverflowEvent::GatherBonus { player, .. }
            | OverflowEvent::CollectiblePickup { player, .. }
            | OverflowEvent::ItemPickup { player, .. }
            | OverflowEvent::LootMove { player, .. } => *player,
        }
    }
}

/// What the engine should do after the router saw an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HookResponse {
    /// Carry on with the engine's default handling.
    Continue,
    /// The router took care of the item; the engine must not hand it out.
    Handled,
}
