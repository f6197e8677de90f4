//! Item stacks and their capacity semantics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of an item definition.
///
/// Two stacks merge only when their identifiers compare equal; anything
/// richer (skins, metadata) is resolved by the inventory substrate before a
/// stack reaches this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// A quantity of one item type occupying a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item definition this stack belongs to.
    pub item_id: ItemId,
    /// Number of items in the stack.
    pub count: u32,
    /// Largest count a single slot may hold for this item type.
    pub max_stack_size: u32,
}

impl ItemStack {
    /// Create a new item stack.
    pub fn new(item_id: ItemId, count: u32, max_stack_size: u32) -> Self {
        Self {
            item_id,
            count,
            max_stack_size,
        }
    }

    /// A stack is well formed when both its count and stack limit are positive.
    pub fn is_valid(&self) -> bool {
        self.count > 0 && self.max_stack_size > 0
    }

    /// Check if this stack can merge with another stack.
    pub fn can_merge(&self, other: &ItemStack) -> bool {
        self.item_id == other.item_id
    }

    /// Partial stacks have at least one free unit.
    pub fn is_partial(&self) -> bool {
        self.count < self.max_stack_size
    }

    /// Check if this stack is at max capacity.
    pub fn is_full(&self) -> bool {
        !self.is_partial()
    }

    /// Get remaining space in this stack.
    pub fn remaining_space(&self) -> u32 {
        self.max_stack_size.saturating_sub(self.count)
    }

    /// Try to add items to this stack, returning the amount that didn't fit.
    pub fn add(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.remaining_space());
        self.count += added;
        amount - added
    }

    /// Number of fresh slots needed to hold `amount` units of this type.
    ///
    /// Returns 0 for a zero stack limit; such stacks never pass validation.
    pub fn slots_for(&self, amount: u32) -> u32 {
        if self.max_stack_size == 0 {
            return 0;
        }
        amount.div_ceil(self.max_stack_size)
    }

    /// Copy of this stack carrying a different count.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }
}
