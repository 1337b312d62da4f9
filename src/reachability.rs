//! Transitive reachability over the branch graph.
//!
//! Paths are the nodes of the graph and block child links are its edges. The
//! traversal is breadth-first with an explicit visited set, so malformed input
//! that loops back on itself still terminates. Results are returned as ordered
//! sets; expansion order never leaks into the output.

use crate::graph::{Block, PathId, WorkflowSnapshot};
use ahash::AHashSet;
use std::collections::{BTreeSet, VecDeque};

/// Every path reachable from `start` by following child links, excluding `start` itself.
///
/// A start id with no matching path, or a path with no blocks, yields an empty set.
pub fn reachable_paths(start: PathId, snapshot: &WorkflowSnapshot) -> BTreeSet<PathId> {
    let mut visited = AHashSet::new();
    visited.insert(start);
    traverse([start], visited, snapshot)
}

/// Every path a block branches into, plus everything reachable from those paths.
///
/// Unlike `reachable_paths` nothing is excluded: if the graph loops back to the
/// block's own path, that path is part of the result.
pub fn reachable_from_block(block: &Block, snapshot: &WorkflowSnapshot) -> BTreeSet<PathId> {
    let mut visited = AHashSet::new();
    let mut seeds = Vec::new();
    for target in block.child_path_ids() {
        if visited.insert(target) {
            seeds.push(target);
        }
    }
    let mut result: BTreeSet<PathId> = seeds.iter().copied().collect();
    result.extend(traverse(seeds, visited, snapshot));
    result
}

/// Reachable set for several seed paths at once. Seeds are included.
pub fn reachable_from_paths(
    seeds: impl IntoIterator<Item = PathId>,
    snapshot: &WorkflowSnapshot,
) -> BTreeSet<PathId> {
    let mut visited = AHashSet::new();
    let seeds: Vec<PathId> = seeds.into_iter().filter(|id| visited.insert(*id)).collect();
    let mut result: BTreeSet<PathId> = seeds.iter().copied().collect();
    result.extend(traverse(seeds, visited, snapshot));
    result
}

/// Expands `seeds` breadth-first. Ids already in `visited` are never expanded again.
/// Returns the newly discovered ids; the seeds themselves are not added.
fn traverse(
    seeds: impl IntoIterator<Item = PathId>,
    mut visited: AHashSet<PathId>,
    snapshot: &WorkflowSnapshot,
) -> BTreeSet<PathId> {
    let mut discovered = BTreeSet::new();
    let mut queue: VecDeque<PathId> = seeds.into_iter().collect();

    while let Some(current) = queue.pop_front() {
        let Some(path) = snapshot.path(current) else {
            continue;
        };
        for target in path.blocks.iter().flat_map(|b| b.child_path_ids()) {
            if visited.insert(target) {
                discovered.insert(target);
                queue.push_back(target);
            }
        }
    }
    discovered
}
