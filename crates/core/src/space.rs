//! Container space calculator.
//!
//! [`has_space`] is coarse: one free unit in a matching partial
//! stack, or one empty slot, is enough to answer `true` regardless of how many
//! units the candidate carries. [`evaluate`] reports the precise slot demand
//! alongside that answer for callers that want to log or display it.

use crate::container::ContainerSnapshot;
use crate::item::ItemStack;
use serde::Serialize;

/// Result of a single space query. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowDecision {
    /// Same answer as [`has_space`].
    pub fits: bool,
    /// Fresh slots the full candidate would occupy after topping up partial stacks.
    pub slots_required: u32,
}

/// Returns true if `container` has a partial stack of the candidate's type or
/// an empty slot. The candidate's quantity does not matter.
pub fn has_space(container: &ContainerSnapshot, candidate: &ItemStack) -> bool {
    let tops_up = container
        .entries()
        .iter()
        .any(|existing| existing.item_id == candidate.item_id && existing.is_partial());

    tops_up || container.len() < container.capacity()
}

/// [`has_space`] plus the slot demand of the full candidate.
pub fn evaluate(container: &ContainerSnapshot, candidate: &ItemStack) -> OverflowDecision {
    let spare = container
        .stack_spare()
        .get(&candidate.item_id)
        .copied()
        .unwrap_or(0);
    let residual = u64::from(candidate.count).saturating_sub(spare);
    let residual = u32::try_from(residual).unwrap_or(u32::MAX);

    OverflowDecision {
        fits: has_space(container, candidate),
        slots_required: candidate.slots_for(residual),
    }
}

/// Primary storage is full for `candidate` when none of its containers has space.
pub fn storage_full<'a, I>(containers: I, candidate: &ItemStack) -> bool
where
    I: IntoIterator<Item = &'a ContainerSnapshot>,
{
    !containers
        .into_iter()
        .any(|container| has_space(container, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;

    fn stack(id: u32, count: u32, max: u32) -> ItemStack {
        ItemStack::new(ItemId(id), count, max)
    }

    fn full_of_other_items(capacity: usize) -> ContainerSnapshot {
        let entries = (0..capacity as u32).map(|i| stack(1000 + i, 1, 1)).collect();
        ContainerSnapshot::with_entries(capacity, entries).unwrap()
    }

    #[test]
    fn empty_slot_is_enough() {
        let container = ContainerSnapshot::with_entries(2, vec![stack(1, 64, 64)]).unwrap();
        assert!(has_space(&container, &stack(9, 1, 64)));
    }

    #[test]
    fn partial_stack_is_enough_when_full() {
        let container =
            ContainerSnapshot::with_entries(2, vec![stack(1, 64, 64), stack(2, 63, 64)]).unwrap();
        assert!(has_space(&container, &stack(2, 1, 64)));
        assert!(!has_space(&container, &stack(1, 1, 64)));
        assert!(!has_space(&container, &stack(3, 1, 64)));
    }

    #[test]
    fn quantity_does_not_change_the_answer() {
        let container =
            ContainerSnapshot::with_entries(1, vec![stack(2, 63, 64)]).unwrap();
        assert!(has_space(&container, &stack(2, 1, 64)));
        assert!(has_space(&container, &stack(2, 10_000, 64)));
    }

    #[test]
    fn evaluate_reports_slot_demand() {
        let container = ContainerSnapshot::with_entries(40, vec![stack(5, 90, 100)]).unwrap();
        let decision = evaluate(&container, &stack(5, 250, 100));

        assert!(decision.fits);
        assert_eq!(decision.slots_required, 3);
    }

    #[test]
    fn storage_full_checks_every_container() {
        let main = full_of_other_items(24);
        let belt = ContainerSnapshot::with_entries(1, vec![stack(7, 3, 10)]).unwrap();

        assert!(!storage_full([&main, &belt], &stack(7, 50, 10)));
        assert!(storage_full([&main, &belt], &stack(8, 1, 10)));
    }

    #[test]
    fn repeated_queries_agree() {
        let container = full_of_other_items(3);
        let candidate = stack(4, 2, 4);
        assert_eq!(has_space(&container, &candidate), has_space(&container, &candidate));
        assert_eq!(evaluate(&container, &candidate), evaluate(&container, &candidate));
    }
}
