//! Overflow router.
//!
//! Every routing attempt is one-shot: `Evaluating -> Fits | Overflowed |
//! Rejected`. The decision depends only on the snapshots the substrate hands
//! out, so repeating a call against unchanged containers repeats the outcome.

use overflow_core::{has_space, project_batch, storage_full, ItemStack, PlayerId, Projection};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OverflowConfig;
use crate::events::{BatchSource, HookResponse, OverflowEvent};
use crate::preferences::{PreferenceStore, Preferences, StoreError};
use crate::queue::{DeferredMove, TaskQueue};
use crate::substrate::{InventorySubstrate, ItemHandle, NotificationSink, PermissionGate};

/// Why a route was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The backpack has no room.
    CapacityExceeded,
    /// The substrate refused the move even though the pre-check saw room.
    MoveDeclined,
}

/// Terminal state of one routing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteOutcome {
    /// Primary storage can take the item; nothing was done.
    Fits,
    /// The item went to the backpack.
    Overflowed {
        /// Units moved.
        moved: u32,
    },
    /// Nothing was moved and the source is untouched.
    Rejected(RejectReason),
}

/// Invalid input: routing aborts before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The substrate does not know the player.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The item no longer exists.
    #[error("unknown item {0}")]
    UnknownItem(ItemHandle),
    /// A zero count or zero stack limit.
    #[error("invalid stack of {item_id}: count {count}, max {max_stack_size}")]
    InvalidStack {
        /// Offending item type.
        item_id: overflow_core::ItemId,
        /// Stack count.
        count: u32,
        /// Stack limit.
        max_stack_size: u32,
    },
    /// The player carries no backpack.
    #[error("player {0} has no backpack")]
    NoBackpack(PlayerId),
}

fn validate(stack: &ItemStack) -> Result<(), RouteError> {
    if stack.is_valid() {
        Ok(())
    } else {
        Err(RouteError::InvalidStack {
            item_id: stack.item_id,
            count: stack.count,
            max_stack_size: stack.max_stack_size,
        })
    }
}

/// Routes overflow into backpacks. Owns its collaborators.
pub struct OverflowRouter<S, P, G, N> {
    substrate: S,
    preferences: Preferences<P>,
    gate: G,
    notifier: N,
    config: OverflowConfig,
    tasks: TaskQueue,
}

impl<S, P, G, N> OverflowRouter<S, P, G, N>
where
    S: InventorySubstrate,
    P: PreferenceStore,
    G: PermissionGate,
    N: NotificationSink,
{
    /// Wire a router to its collaborators.
    pub fn new(substrate: S, store: P, gate: G, notifier: N, config: OverflowConfig) -> Self {
        Self {
            substrate,
            preferences: Preferences::new(store),
            gate,
            notifier,
            config,
            tasks: TaskQueue::new(),
        }
    }

    /// Inventory substrate.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Mutable inventory substrate, for the engine side of the simulation.
    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    /// Notification sink.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Mutable notification sink.
    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Backing preference store.
    pub fn preference_store(&self) -> &P {
        self.preferences.store()
    }

    /// Permission gate.
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Active configuration.
    pub fn config(&self) -> &OverflowConfig {
        &self.config
    }

    /// Deferred work waiting for the next tick.
    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Preference for `player`, persisting the default on first read.
    pub fn overflow_enabled(&mut self, player: PlayerId) -> bool {
        self.preferences.enabled_for(player)
    }

    /// Flip the preference for `player` and return the new value.
    pub fn toggle_overflow(&mut self, player: PlayerId) -> Result<bool, StoreError> {
        self.preferences.toggle(player)
    }

    /// Route one live item, moving it into the backpack when primary storage is full.
    pub fn route_single(
        &mut self,
        player: PlayerId,
        item: ItemHandle,
    ) -> Result<RouteOutcome, RouteError> {
        let stack = self
            .substrate
            .item(item)
            .cloned()
            .ok_or(RouteError::UnknownItem(item))?;
        validate(&stack)?;

        if !self.primary_full(player, &stack)? {
            return Ok(RouteOutcome::Fits);
        }
        self.move_to_backpack(player, item, stack.count)
    }

    /// Route a batch as one feasibility unit.
    ///
    /// Either every yield is moved and the source destroyed, or nothing
    /// happens. Overflowing entries are committed before the ones primary
    /// storage could have taken. A stand-in whose move still fails at commit
    /// time is discarded.
    pub fn route_batch(
        &mut self,
        player: PlayerId,
        source: &BatchSource,
    ) -> Result<RouteOutcome, RouteError> {
        for stack in &source.yields {
            validate(stack)?;
        }

        let projection = {
            let primary = self
                .substrate
                .primary_containers(player)
                .ok_or(RouteError::UnknownPlayer(player))?;
            let backpack = self
                .substrate
                .backpack(player)
                .ok_or(RouteError::NoBackpack(player))?;
            project_batch(&primary, backpack, &source.yields)
        };

        let overflow_entries = match projection {
            Projection::NoOverrideNeeded => return Ok(RouteOutcome::Fits),
            Projection::DoesNotFit { failed_at } => {
                debug!(%player, failed_at, "batch does not fit in backpack");
                return Ok(RouteOutcome::Rejected(RejectReason::CapacityExceeded));
            }
            Projection::Fits {
                overflow_entries,
                slots_used,
            } => {
                debug!(%player, slots_used, "batch fits in backpack");
                overflow_entries
            }
        };

        // Entries the ledger reserved space for go first so primary-fitting
        // yields cannot take their slots.
        let mut order = overflow_entries.clone();
        order.extend((0..source.yields.len()).filter(|index| !overflow_entries.contains(index)));

        let mut moved = 0u32;
        for stack in order.into_iter().map(|index| &source.yields[index]) {
            let Some(stand_in) = self.substrate.materialize(stack) else {
                warn!(%player, item = %stack.item_id, "could not materialize stand-in");
                continue;
            };
            match self.move_to_backpack(player, stand_in, stack.count) {
                Ok(RouteOutcome::Overflowed { moved: count }) => {
                    moved = moved.saturating_add(count);
                }
                outcome => {
                    warn!(%player, item = %stack.item_id, ?outcome, "discarding stand-in");
                    self.substrate.discard(stand_in);
                }
            }
        }

        self.substrate.destroy_source(source.id);
        Ok(RouteOutcome::Overflowed { moved })
    }

    /// Route a copy of an engine-owned item. The copy is discarded unless it lands.
    pub fn route_detached(
        &mut self,
        player: PlayerId,
        item: ItemHandle,
    ) -> Result<RouteOutcome, RouteError> {
        let stack = self
            .substrate
            .item(item)
            .cloned()
            .ok_or(RouteError::UnknownItem(item))?;
        validate(&stack)?;

        if !self.primary_full(player, &stack)? {
            return Ok(RouteOutcome::Fits);
        }

        let Some(duplicate) = self.substrate.materialize(&stack) else {
            warn!(%player, item = %stack.item_id, "could not materialize duplicate");
            return Ok(RouteOutcome::Rejected(RejectReason::MoveDeclined));
        };
        let outcome = self.move_to_backpack(player, duplicate, stack.count);
        if !matches!(outcome, Ok(RouteOutcome::Overflowed { .. })) {
            self.substrate.discard(duplicate);
        }
        outcome
    }

    /// React to an engine event.
    pub fn handle(&mut self, event: &OverflowEvent) -> HookResponse {
        let player = event.player();
        if !self.config.hook_enabled(event.kind()) {
            return HookResponse::Continue;
        }
        if self.substrate.primary_containers(player).is_none() {
            debug!(%player, kind = ?event.kind(), "event for unknown player");
            return HookResponse::Continue;
        }
        if !self.routing_allowed(player) {
            return HookResponse::Continue;
        }
        if self.substrate.backpack(player).is_none() {
            return HookResponse::Continue;
        }

        let routed = match event {
            OverflowEvent::Gather { item, .. } => self.route_detached(player, *item),
            OverflowEvent::GatherBonus { item, .. } => {
                self.defer_bonus(player, *item);
                return HookResponse::Continue;
            }
            OverflowEvent::CollectiblePickup { source, .. } => self.route_batch(player, source),
            OverflowEvent::ItemPickup { item, .. } => self.route_single(player, *item),
            OverflowEvent::LootMove { item, .. } => {
                if self.substrate.in_player_inventory(player, *item) {
                    return HookResponse::Continue;
                }
                self.route_single(player, *item)
            }
        };

        match routed {
            Ok(RouteOutcome::Overflowed { .. }) => HookResponse::Handled,
            Ok(_) => HookResponse::Continue,
            Err(err) => {
                debug!(%player, kind = ?event.kind(), "routing aborted: {err}");
                HookResponse::Continue
            }
        }
    }

    /// Advance the scheduler one tick and run the deferred moves now due.
    ///
    /// A task whose player disconnected, whose item vanished or whose backpack
    /// is gone is dropped without effect.
    pub fn tick(&mut self) -> Vec<RouteOutcome> {
        let mut outcomes = Vec::new();
        for task in self.tasks.advance() {
            if !self.task_still_valid(&task) {
                debug!(player = %task.player, item = %task.item, "deferred move cancelled");
                continue;
            }
            match self.move_to_backpack(task.player, task.item, task.amount) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => debug!(player = %task.player, "deferred move aborted: {err}"),
            }
        }
        outcomes
    }

    fn routing_allowed(&mut self, player: PlayerId) -> bool {
        self.gate.may_use(player) && self.preferences.enabled_for(player)
    }

    fn primary_full(&self, player: PlayerId, stack: &ItemStack) -> Result<bool, RouteError> {
        let primary = self
            .substrate
            .primary_containers(player)
            .ok_or(RouteError::UnknownPlayer(player))?;
        Ok(storage_full(primary, stack))
    }

    fn defer_bonus(&mut self, player: PlayerId, item: ItemHandle) {
        let Some(stack) = self.substrate.item(item).cloned() else {
            return;
        };
        if validate(&stack).is_err() {
            return;
        }
        match self.primary_full(player, &stack) {
            Ok(true) => self.tasks.post(DeferredMove {
                player,
                item,
                amount: stack.count,
            }),
            Ok(false) => {}
            Err(err) => debug!(%player, "bonus routing aborted: {err}"),
        }
    }

    fn task_still_valid(&self, task: &DeferredMove) -> bool {
        self.substrate.is_connected(task.player)
            && self.substrate.item(task.item).is_some()
            && self.substrate.backpack(task.player).is_some()
    }

    /// Coarse backpack check, then the substrate's move, then the notification.
    fn move_to_backpack(
        &mut self,
        player: PlayerId,
        item: ItemHandle,
        amount: u32,
    ) -> Result<RouteOutcome, RouteError> {
        let stack = self
            .substrate
            .item(item)
            .cloned()
            .ok_or(RouteError::UnknownItem(item))?;
        let backpack = self
            .substrate
            .backpack(player)
            .ok_or(RouteError::NoBackpack(player))?;

        if !has_space(backpack, &stack) {
            return Ok(RouteOutcome::Rejected(RejectReason::CapacityExceeded));
        }
        if !self.substrate.move_to_backpack(player, item) {
            warn!(%player, item = %stack.item_id, "substrate declined backpack move");
            return Ok(RouteOutcome::Rejected(RejectReason::MoveDeclined));
        }

        info!(%player, item = %stack.item_id, amount, "moved overflow to backpack");
        if self.config.send_notification {
            if let Err(err) = self.notifier.overflow_moved(player, stack.item_id, amount) {
                warn!("{err}");
            }
        }
        Ok(RouteOutcome::Overflowed { moved: amount })
    }
}
