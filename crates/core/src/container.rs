//! Fixed-capacity containers.
//!
//! A [`ContainerSnapshot`] is what the space calculator and the batch
//! projection read. The inventory substrate owns the live copy and is the only
//! caller of [`ContainerSnapshot::insert_stacking`].

use crate::item::{ItemId, ItemStack};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// More entries than slots.
    #[error("container holds {entries} stacks but only has {capacity} slots")]
    OverCapacity {
        /// Slot capacity of the container.
        capacity: usize,
        /// Number of entries supplied.
        entries: usize,
    },
    /// An entry with a zero count or zero stack limit.
    #[error("invalid stack of {item_id}: count {count}, max {max_stack_size}")]
    InvalidStack {
        /// Offending item type.
        item_id: ItemId,
        /// Stack count.
        count: u32,
        /// Stack limit.
        max_stack_size: u32,
    },
}

/// A container's contents at a point in time. Each entry occupies one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContainerRepr")]
pub struct ContainerSnapshot {
    capacity: usize,
    entries: Vec<ItemStack>,
}

#[derive(Deserialize)]
struct ContainerRepr {
    capacity: usize,
    #[serde(default)]
    entries: Vec<ItemStack>,
}

impl TryFrom<ContainerRepr> for ContainerSnapshot {
    type Error = ContainerError;

    fn try_from(repr: ContainerRepr) -> Result<Self, Self::Error> {
        Self::with_entries(repr.capacity, repr.entries)
    }
}

impl ContainerSnapshot {
    /// Create an empty container with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Create a container pre-filled with `entries`.
    pub fn with_entries(capacity: usize, entries: Vec<ItemStack>) -> Result<Self, ContainerError> {
        if entries.len() > capacity {
            return Err(ContainerError::OverCapacity {
                capacity,
                entries: entries.len(),
            });
        }
        if let Some(bad) = entries.iter().find(|stack| !stack.is_valid()) {
            return Err(ContainerError::InvalidStack {
                item_id: bad.item_id,
                count: bad.count,
                max_stack_size: bad.max_stack_size,
            });
        }
        Ok(Self { capacity, entries })
    }

    /// Fixed slot capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied slots.
    pub fn entries(&self) -> &[ItemStack] {
        &self.entries
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the container holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the number of empty slots.
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    /// Check if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Count the total number of a specific item in the container.
    pub fn count_item(&self, item_id: ItemId) -> u64 {
        self.entries
            .iter()
            .filter(|stack| stack.item_id == item_id)
            .map(|stack| u64::from(stack.count))
            .sum()
    }

    /// Spare units across the partial stacks of each item type.
    ///
    /// Full stacks contribute nothing; types with no partial stack are absent.
    pub fn stack_spare(&self) -> HashMap<ItemId, u64> {
        let mut spare: HashMap<ItemId, u64> = HashMap::new();
        for stack in self.entries.iter().filter(|stack| stack.is_partial()) {
            *spare.entry(stack.item_id).or_default() += u64::from(stack.remaining_space());
        }
        spare
    }

    /// Whether `stack` would fit in its entirety, topping up partial stacks first.
    pub fn can_absorb(&self, stack: &ItemStack) -> bool {
        let spare = self.stack_spare().get(&stack.item_id).copied().unwrap_or(0);
        let residual = u64::from(stack.count).saturating_sub(spare);
        let slots = residual.div_ceil(u64::from(stack.max_stack_size.max(1)));
        slots <= self.free_slots() as u64
    }

    /// Move `stack` in with stacking allowed.
    ///
    /// Partial stacks of the same type are topped up first, then empty slots
    /// are used. The insert is all-or-nothing: when the whole stack does not
    /// fit the container is left untouched and the stack is handed back.
    pub fn insert_stacking(&mut self, stack: ItemStack) -> Result<(), ItemStack> {
        if !stack.is_valid() || !self.can_absorb(&stack) {
            return Err(stack);
        }

        let mut remaining = stack.count;
        for existing in self.entries.iter_mut() {
            if remaining == 0 {
                break;
            }
            if existing.can_merge(&stack) && existing.is_partial() {
                remaining = existing.add(remaining);
            }
        }

        while remaining > 0 {
            let take = remaining.min(stack.max_stack_size);
            self.entries.push(stack.with_count(take));
            remaining -= take;
        }
        Ok(())
    }
}
