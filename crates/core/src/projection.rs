//! Batch projection engine.
//!
//! Decides whether a batch of stacks arriving from one event fits into the
//! secondary container as a whole. Nothing is mutated: the secondary's free
//! slots and per-type stack spare are copied into a local ledger and consumed
//! entry by entry.
//!
//! Entries that primary storage can still take are skipped. Each entry is
//! probed against primary storage as it is, not as it would be after earlier
//! entries of the batch landed there.

use crate::container::ContainerSnapshot;
use crate::item::{ItemId, ItemStack};
use crate::space::storage_full;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Outcome of [`project_batch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Projection {
    /// Every entry fits in primary storage; the caller must not move or destroy anything.
    NoOverrideNeeded,
    /// The overflowing entries all fit in the secondary container.
    Fits {
        /// Batch indices that needed overflow routing.
        overflow_entries: Vec<usize>,
        /// Fresh secondary slots the overflow consumes.
        slots_used: usize,
    },
    /// Free slots ran out while processing entry `failed_at`.
    DoesNotFit {
        /// Batch index at which the slot budget went negative.
        failed_at: usize,
    },
}

impl Projection {
    /// Boolean view: true only for [`Projection::Fits`].
    pub fn fits(&self) -> bool {
        matches!(self, Projection::Fits { .. })
    }
}

/// Spare capacity ledger for one projection.
///
/// Stack spare is shared by every entry of the same type and is never
/// replenished, so a partial stack is allocated at most once.
#[derive(Debug, Clone)]
pub struct SpaceLedger {
    free_slots: i64,
    stack_spare: HashMap<ItemId, u64>,
}

impl SpaceLedger {
    /// Seed the ledger from a container snapshot.
    pub fn from_container(container: &ContainerSnapshot) -> Self {
        Self {
            free_slots: container.capacity() as i64 - container.len() as i64,
            stack_spare: container.stack_spare(),
        }
    }

    /// Remaining free slots; negative once over budget.
    pub fn free_slots(&self) -> i64 {
        self.free_slots
    }

    /// Remaining spare units in partial stacks of `item_id`.
    pub fn spare_for(&self, item_id: ItemId) -> u64 {
        self.stack_spare.get(&item_id).copied().unwrap_or(0)
    }

    /// Charge `stack` against the ledger, returning the fresh slots it took.
    ///
    /// Returns `None` when the free-slot budget goes negative.
    pub fn charge(&mut self, stack: &ItemStack) -> Option<usize> {
        let mut amount = u64::from(stack.count);

        if let Some(spare) = self.stack_spare.get_mut(&stack.item_id) {
            let used = (*spare).min(amount);
            *spare -= used;
            amount -= used;
        }

        if amount == 0 {
            return Some(0);
        }

        let slots = amount.div_ceil(u64::from(stack.max_stack_size.max(1)));
        self.free_slots -= i64::try_from(slots).unwrap_or(i64::MAX);
        if self.free_slots < 0 {
            return None;
        }
        usize::try_from(slots).ok()
    }
}

/// Project `batch` into `secondary`, skipping entries `primary` can still take.
pub fn project_batch(
    primary: &[&ContainerSnapshot],
    secondary: &ContainerSnapshot,
    batch: &[ItemStack],
) -> Projection {
    let mut ledger = SpaceLedger::from_container(secondary);
    let mut overflow_entries = Vec::new();
    let mut slots_used = 0usize;

    for (index, entry) in batch.iter().enumerate() {
        if !storage_full(primary.iter().copied(), entry) {
            trace!(index, item = %entry.item_id, "entry fits in primary storage");
            continue;
        }

        overflow_entries.push(index);
        match ledger.charge(entry) {
            Some(slots) => slots_used += slots,
            None => {
                trace!(index, item = %entry.item_id, "secondary out of slots");
                return Projection::DoesNotFit { failed_at: index };
            }
        }
    }

    if overflow_entries.is_empty() {
        return Projection::NoOverrideNeeded;
    }

    Projection::Fits {
        overflow_entries,
        slots_used,
    }
}
