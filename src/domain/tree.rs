use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::menu::{MenuEntry, MenuTree, ROOT_PARENT};

/// Deepest nesting `organize` accepts; roots sit at level 1.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuTreeError {
    #[error("menu entry `{id}` uses the reserved root id")]
    ReservedId { id: u64 },
    #[error("duplicate menu entry id `{id}` detected")]
    DuplicateId { id: u64 },
    #[error("menu entry `{id}` sits on a parent cycle {chain:?}")]
    CyclicParentReference { id: u64, chain: Vec<u64> },
    #[error("menu entry `{id}` is nested deeper than {max} levels")]
    TooDeep { id: u64, max: usize },
}

/// Nest flat menu entries under their declared parents.
///
/// Siblings keep their relative input order. Entries whose parent id is not
/// present in the input are promoted to the root level in place. Chains
/// nested beyond [`MAX_DEPTH`] levels are rejected.
pub fn organize(entries: Vec<MenuEntry>) -> Result<MenuTree, MenuTreeError> {
    let mut index_by_id: HashMap<u64, usize> = HashMap::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if entry.id == ROOT_PARENT {
            return Err(MenuTreeError::ReservedId { id: entry.id });
        }
        if index_by_id.insert(entry.id, index).is_some() {
            return Err(MenuTreeError::DuplicateId { id: entry.id });
        }
    }

    let mut roots = Vec::new();
    let mut children: HashMap<u64, Vec<usize>> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_top_level() {
            roots.push(index);
        } else if index_by_id.contains_key(&entry.parent_id) {
            children.entry(entry.parent_id).or_default().push(index);
        } else {
            debug!(
                entry = entry.id,
                parent = entry.parent_id,
                "Promoting orphaned menu entry to root"
            );
            roots.push(index);
        }
    }

    let ids: Vec<u64> = entries.iter().map(|entry| entry.id).collect();
    let parents: Vec<u64> = entries.iter().map(|entry| entry.parent_id).collect();
    let mut slots = entries;
    let mut placed = vec![false; slots.len()];

    let mut tree = Vec::with_capacity(roots.len());
    for root in roots {
        assemble(root, &ids, &children, &mut slots, &mut placed, &mut tree)?;
    }

    if let Some(stranded) = placed.iter().position(|done| !done) {
        return Err(MenuTreeError::CyclicParentReference {
            id: ids[stranded],
            chain: ancestor_chain(stranded, &ids, &parents, &index_by_id),
        });
    }

    Ok(MenuTree::new(tree))
}

struct Frame {
    index: usize,
    next_child: usize,
    built: Vec<MenuEntry>,
}

impl Frame {
    fn new(index: usize) -> Self {
        Self {
            index,
            next_child: 0,
            built: Vec::new(),
        }
    }
}

/// Depth-first build with an explicit stack holding the current path.
/// Each index has a single parent, so none is visited twice.
fn assemble(
    root: usize,
    ids: &[u64],
    children: &HashMap<u64, Vec<usize>>,
    slots: &mut [MenuEntry],
    placed: &mut [bool],
    tree: &mut Vec<MenuEntry>,
) -> Result<(), MenuTreeError> {
    let mut stack = vec![Frame::new(root)];

    while let Some(mut frame) = stack.pop() {
        let kids = children
            .get(&ids[frame.index])
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(&child) = kids.get(frame.next_child) {
            frame.next_child += 1;
            stack.push(frame);
            if stack.len() >= MAX_DEPTH {
                return Err(MenuTreeError::TooDeep {
                    id: ids[child],
                    max: MAX_DEPTH,
                });
            }
            stack.push(Frame::new(child));
            continue;
        }

        let mut entry = std::mem::take(&mut slots[frame.index]);
        entry.children = frame.built;
        placed[frame.index] = true;

        match stack.last_mut() {
            Some(parent) => parent.built.push(entry),
            None => tree.push(entry),
        }
    }
    Ok(())
}

fn ancestor_chain(
    start: usize,
    ids: &[u64],
    parents: &[u64],
    index_by_id: &HashMap<u64, usize>,
) -> Vec<u64> {
    let mut chain = vec![ids[start]];
    let mut current = start;
    while let Some(&parent) = index_by_id.get(&parents[current]) {
        let repeated = chain.contains(&ids[parent]);
        chain.push(ids[parent]);
        if repeated {
            break;
        }
        current = parent;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, parent: u64) -> MenuEntry {
        MenuEntry::new(id, parent).with_title(format!("Item {id}"))
    }

    fn ids(entries: &[MenuEntry]) -> Vec<u64> {
        entries.iter().map(|entry| entry.id).collect()
    }

    /// Straightforward full-rescan recursion, used as the reference output.
    fn organize_by_rescan(entries: &[MenuEntry], parent: u64) -> Vec<MenuEntry> {
        entries
            .iter()
            .filter(|candidate| candidate.parent_id == parent)
            .map(|candidate| {
                let mut node = candidate.clone();
                node.children = organize_by_rescan(entries, candidate.id);
                node
            })
            .collect()
    }

    /// Deterministic forest with parents chosen among earlier ids, then shuffled.
    fn generated_menu(size: u64, seed: u64) -> Vec<MenuEntry> {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            state >> 33
        };

        let mut entries: Vec<MenuEntry> = (1..=size)
            .map(|id| {
                let parent = next() % id;
                entry(id, parent)
            })
            .collect();

        for i in (1..entries.len()).rev() {
            let j = (next() % (i as u64 + 1)) as usize;
            entries.swap(i, j);
        }
        entries
    }

    #[test]
    fn organizes_documented_scenario() {
        let input = vec![entry(1, 0), entry(2, 1), entry(3, 0), entry(4, 99)];

        let tree = organize(input).expect("tree");

        assert_eq!(ids(tree.roots()), vec![1, 3, 4]);
        assert_eq!(ids(&tree.roots()[0].children), vec![2]);
        assert!(tree.roots()[0].children[0].children.is_empty());
        assert!(tree.roots()[1].children.is_empty());
        assert!(tree.roots()[2].children.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_tree() {
        let tree = organize(Vec::new()).expect("tree");
        assert!(tree.is_empty());
        assert_eq!(tree, MenuTree::default());
    }

    #[test]
    fn matches_rescan_reference_on_generated_menus() {
        for seed in 1..=20 {
            let input = generated_menu(40, seed);
            let expected = MenuTree::new(organize_by_rescan(&input, ROOT_PARENT));

            let tree = organize(input).expect("tree");

            assert_eq!(tree, expected, "seed {seed}");
        }
    }

    #[test]
    fn organizing_twice_gives_identical_trees() {
        let input = generated_menu(60, 7);

        let first = organize(input.clone()).expect("first");
        let second = organize(input).expect("second");

        assert_eq!(first, second);
    }

    #[test]
    fn every_entry_appears_exactly_once() {
        let mut input = generated_menu(50, 11);
        input.push(entry(500, 404));
        input.push(entry(501, 500));
        let expected_len = input.len();

        let tree = organize(input).expect("tree");

        let mut seen: Vec<u64> = tree.walk().map(|(_, e)| e.id).collect();
        assert_eq!(seen.len(), expected_len);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), expected_len);
    }

    #[test]
    fn siblings_keep_input_order() {
        let input = vec![
            entry(10, 0),
            entry(30, 10),
            entry(20, 0),
            entry(11, 10),
            entry(40, 10),
        ];

        let tree = organize(input).expect("tree");

        assert_eq!(ids(tree.roots()), vec![10, 20]);
        assert_eq!(ids(&tree.roots()[0].children), vec![30, 11, 40]);
    }

    #[test]
    fn children_may_precede_their_parent() {
        let input = vec![entry(3, 2), entry(2, 1), entry(1, 0)];

        let tree = organize(input).expect("tree");

        assert_eq!(ids(tree.roots()), vec![1]);
        assert_eq!(ids(&tree.roots()[0].children), vec![2]);
        assert_eq!(ids(&tree.roots()[0].children[0].children), vec![3]);
    }

    #[test]
    fn orphans_keep_their_position_among_roots() {
        let input = vec![entry(5, 77), entry(1, 0), entry(6, 5), entry(2, 0)];

        let tree = organize(input).expect("tree");

        assert_eq!(ids(tree.roots()), vec![5, 1, 2]);
        assert_eq!(ids(&tree.roots()[0].children), vec![6]);
    }

    #[test]
    fn stale_children_from_the_source_are_replaced() {
        let mut parent = entry(1, 0);
        parent.children.push(entry(42, 1));
        let input = vec![parent, entry(2, 1)];

        let tree = organize(input).expect("tree");

        assert_eq!(ids(&tree.roots()[0].children), vec![2]);
    }

    #[test]
    fn rejects_parent_cycles() {
        let input = vec![entry(1, 0), entry(2, 3), entry(3, 4), entry(4, 2)];

        let err = organize(input).expect_err("cycle");

        assert_eq!(
            err,
            MenuTreeError::CyclicParentReference {
                id: 2,
                chain: vec![2, 3, 4, 2],
            }
        );
    }

    #[test]
    fn rejects_self_parenting_entry() {
        let err = organize(vec![entry(1, 0), entry(9, 9)]).expect_err("cycle");
        assert_eq!(
            err,
            MenuTreeError::CyclicParentReference {
                id: 9,
                chain: vec![9, 9],
            }
        );
    }

    #[test]
    fn reports_cycle_even_when_entry_hangs_below_it() {
        let input = vec![entry(5, 6), entry(6, 7), entry(7, 6)];

        let err = organize(input).expect_err("cycle");

        assert_eq!(
            err,
            MenuTreeError::CyclicParentReference {
                id: 5,
                chain: vec![5, 6, 7, 6],
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = organize(vec![entry(1, 0), entry(1, 0)]).expect_err("duplicate");
        assert_eq!(err, MenuTreeError::DuplicateId { id: 1 });
    }

    #[test]
    fn rejects_reserved_root_id() {
        let err = organize(vec![entry(0, 0)]).expect_err("reserved");
        assert_eq!(err, MenuTreeError::ReservedId { id: 0 });
    }

    fn chain(levels: u64) -> Vec<MenuEntry> {
        (1..=levels).map(|id| entry(id, id - 1)).collect()
    }

    #[test]
    fn chains_up_to_max_depth_are_built() {
        let tree = organize(chain(MAX_DEPTH as u64)).expect("tree");

        assert_eq!(tree.len(), MAX_DEPTH);
        let deepest = tree.walk().map(|(depth, _)| depth).max();
        assert_eq!(deepest, Some(MAX_DEPTH - 1));
    }

    #[test]
    fn chains_past_max_depth_are_rejected() {
        let err = organize(chain(MAX_DEPTH as u64 + 1)).expect_err("too deep");

        assert_eq!(
            err,
            MenuTreeError::TooDeep {
                id: MAX_DEPTH as u64 + 1,
                max: MAX_DEPTH,
            }
        );
    }

    #[test]
    fn very_long_chains_fail_fast() {
        let err = organize(chain(100_000)).expect_err("too deep");

        assert!(matches!(err, MenuTreeError::TooDeep { .. }));
    }
}
