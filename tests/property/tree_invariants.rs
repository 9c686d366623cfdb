//! Property-based tests for reclamation and inheritance invariants

use ambient_ctx::store::Store;
use ambient_ctx::{ContextTree, ContextValue, UnitId};
use proptest::prelude::*;
use proptest::sample::Index;

/// Random tree shape (parent picked among earlier units or the root) plus a
/// random finish order.
fn tree_and_finish_order() -> impl Strategy<Value = (Vec<Index>, Vec<usize>)> {
    (1usize..40).prop_flat_map(|n| {
        (
            proptest::collection::vec(any::<Index>(), n),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        )
    })
}

fn build(tree: &mut ContextTree, parents: &[Index]) -> Vec<(UnitId, UnitId)> {
    let mut units: Vec<(UnitId, UnitId)> = Vec::new();
    for pick in parents {
        let unit = build_from(tree, &units, pick);
        units.push(unit);
    }
    units
}

fn build_from(tree: &mut ContextTree, units: &[(UnitId, UnitId)], pick: &Index) -> (UnitId, UnitId) {
    let choice = pick.index(units.len() + 1);
    let parent = if choice == 0 {
        UnitId::ROOT
    } else {
        units[choice - 1].0
    };
    let id = UnitId::issue();
    tree.get_or_create_node(id, parent);
    (id, parent)
}

fn assert_linkage(tree: &ContextTree, units: &[(UnitId, UnitId)]) {
    for (id, parent) in units {
        if let Some(node) = tree.node(*id) {
            let parent_node = tree.node(*parent).expect("live node lost its parent");
            assert!(parent_node.children().contains(id));
            assert_eq!(node.parent_id(), *parent);
            for child in node.children() {
                assert!(tree.contains(*child));
            }
        }
    }
}

/// Every order of finish notifications eventually empties the tree, and no
/// node disappears while a descendant is still live.
#[test]
fn test_any_finish_order_reclaims_everything() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&tree_and_finish_order(), |(parents, order)| {
            let mut tree = ContextTree::default();
            let units = build(&mut tree, &parents);
            let mut finished = vec![false; units.len()];

            for index in order {
                tree.reclaim(units[index].0);
                finished[index] = true;
                assert_linkage(&tree, &units);

                for (position, (id, _)) in units.iter().enumerate() {
                    if !finished[position] {
                        assert!(tree.contains(*id), "unfinished unit was reclaimed");
                    }
                }
            }

            prop_assert_eq!(tree.len(), 1);
            Ok(())
        })
        .unwrap();
}

/// Repeating every finish notification changes nothing.
#[test]
fn test_duplicate_finishes_are_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&tree_and_finish_order(), |(parents, order)| {
            let mut tree = ContextTree::default();
            let units = build(&mut tree, &parents);

            let mut total = 0;
            for index in order {
                total += tree.reclaim(units[index].0);
                prop_assert_eq!(tree.reclaim(units[index].0), 0);
            }

            prop_assert_eq!(total, units.len());
            Ok(())
        })
        .unwrap();
}

/// A write reaches exactly the ancestors joined to the writer by an unbroken
/// run of merged parents, and never the root.
#[test]
fn test_writes_reach_only_sharing_ancestors() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec((any::<Index>(), any::<bool>()), 1..20),
                "[a-z]{1,8}",
            ),
            |(picks, key)| {
                let mut tree = ContextTree::default();
                let mut units: Vec<(UnitId, UnitId)> = Vec::new();
                for (pick, merge) in &picks {
                    let unit = build_from(&mut tree, &units, pick);
                    // Merge is switched on before the unit has any children.
                    if *merge {
                        tree.enable_merge(unit.0);
                    }
                    units.push(unit);
                }
                let (leaf, _) = *units.last().unwrap();

                tree.node(leaf)
                    .unwrap()
                    .store()
                    .insert(key.clone().into(), ContextValue::new(1u8));

                let leaf_store: Store = tree.node(leaf).unwrap().store().clone();
                let mut sharing = true;
                for ancestor in tree.ancestors(leaf).skip(1) {
                    sharing = sharing && ancestor.is_merged();
                    prop_assert_eq!(ancestor.store().ptr_eq(&leaf_store), sharing);
                    prop_assert_eq!(ancestor.store().contains(&key.clone().into()), sharing);
                }
                prop_assert!(!tree.root().store().contains(&key.clone().into()));
                Ok(())
            },
        )
        .unwrap();
}
