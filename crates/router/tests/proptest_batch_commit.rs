//! Property-based tests for all-or-nothing batch commits.

use overflow_core::{project_batch, ItemId, Projection};
use overflow_router::{BatchSource, InventorySubstrate, RouteOutcome, SourceId};
use overflow_testkit::{container, filled, stack, Harness, PLAYER};
use proptest::prelude::*;

proptest! {
    /// Property: a rejected batch moves nothing; an accepted one delivers every
    /// overflowing entry and leaves no stray stand-ins
    #[test]
    fn batch_commit_is_all_or_nothing(
        used in 0usize..=40,
        partial in prop::option::of((1u32..5, 1u32..100)),
        yields in prop::collection::vec((1u32..5, 1u32..400), 1..5),
    ) {
        // Main is full except, optionally, one partial stack that lets
        // matching yields fit primary storage.
        let mut main = filled(24, 24).entries().to_vec();
        if let Some((id, count)) = partial {
            main.pop();
            main.push(stack(id, count, 100));
        }
        let mut router = Harness::new()
            .main(container(24, main))
            .backpack(filled(40, used))
            .build();
        let source = BatchSource {
            id: SourceId(1),
            yields: yields.iter().map(|&(id, count)| stack(id, count, 100)).collect(),
        };
        let before = router.substrate().backpack(PLAYER).cloned();
        let projection = {
            let primary = router.substrate().primary_containers(PLAYER).unwrap();
            let backpack = router.substrate().backpack(PLAYER).unwrap();
            project_batch(&primary, backpack, &source.yields)
        };

        match router.route_batch(PLAYER, &source).unwrap() {
            RouteOutcome::Rejected(_) => {
                prop_assert!(!projection.fits());
                prop_assert_eq!(router.substrate().backpack(PLAYER).cloned(), before);
                prop_assert!(router.substrate().destroyed_sources().is_empty());
            }
            RouteOutcome::Overflowed { moved } => {
                let Projection::Fits { overflow_entries, .. } = projection else {
                    return Err(TestCaseError::fail("commit without a fitting projection"));
                };
                let backpack = router.substrate().backpack(PLAYER).unwrap();
                for index in &overflow_entries {
                    let id = ItemId(yields[*index].0);
                    let expected: u64 = overflow_entries
                        .iter()
                        .filter(|other| yields[**other].0 == yields[*index].0)
                        .map(|other| u64::from(yields[*other].1))
                        .sum();
                    prop_assert!(backpack.count_item(id) >= expected);
                }
                let overflowed: u32 = overflow_entries.iter().map(|index| yields[*index].1).sum();
                prop_assert!(moved >= overflowed);
                prop_assert_eq!(router.substrate().destroyed_sources(), &[SourceId(1)][..]);
            }
            RouteOutcome::Fits => {
                prop_assert_eq!(projection, Projection::NoOverrideNeeded);
                prop_assert!(router.substrate().destroyed_sources().is_empty());
            }
        }
        prop_assert_eq!(router.substrate().loose_items(), 0);
    }
}
