use crate::graph::{Block, BlockId, BlockKind, Path, PathId, WorkflowSnapshot};
use crate::reachability::reachable_from_paths;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// An instruction to change a surviving block's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retype {
    pub block_id: BlockId,
    pub kind: BlockKind,
    /// Drop every child link of the block as part of the retype.
    pub clear_children: bool,
}

/// An instruction to remove a single child link from a surviving block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachLink {
    pub block_id: BlockId,
    pub path_id: PathId,
}

/// The outcome of planning a structural deletion.
///
/// A plan is pure data. `apply_plan` turns it into a new snapshot and
/// `MutationRequest::from_plan` into the call the persistence layer needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeletionPlan {
    /// The path being truncated (or owning the fan-out block for branch removal).
    pub path_id: PathId,
    /// The block the user asked to delete.
    pub target_block: BlockId,
    /// Trailing blocks of `path_id`, ordered by position.
    pub blocks_to_remove: Vec<BlockId>,
    /// Descendant paths no longer fed by any surviving parent block.
    pub paths_to_remove: BTreeSet<PathId>,
    pub blocks_to_retype: Vec<Retype>,
    pub links_to_detach: Vec<DetachLink>,
}

impl DeletionPlan {
    /// A plan that changes nothing but still names the requested block.
    pub(crate) fn empty(path_id: PathId, target_block: BlockId) -> Self {
        Self {
            path_id,
            target_block,
            ..Self::default()
        }
    }

    /// True when applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.blocks_to_remove.is_empty()
            && self.paths_to_remove.is_empty()
            && self.blocks_to_retype.is_empty()
            && self.links_to_detach.is_empty()
    }

    /// Every block id the plan deletes: the trailing blocks plus all blocks of removed paths.
    pub fn deleted_block_ids(&self, snapshot: &WorkflowSnapshot) -> Vec<BlockId> {
        let mut ids = self.blocks_to_remove.clone();
        for path_id in &self.paths_to_remove {
            if let Some(path) = snapshot.path(*path_id) {
                ids.extend(path.blocks.iter().map(|b| b.id));
            }
        }
        ids
    }
}

/// Plans the deletion of `block_id` and everything that structurally depends on it.
///
/// Every block of `path` at or after the target's position is removed, except
/// `MERGE` blocks, which are rejoin points and outlive the branch being pruned.
/// Paths fed by the removed blocks are removed too, unless another surviving
/// parent block still feeds them. If the truncated path is left ending in an
/// ordinary block, that block becomes the new `LAST` affordance.
///
/// A block id that does not belong to `path` yields an empty plan.
pub fn plan_block_deletion(
    path: &Path,
    block_id: BlockId,
    snapshot: &WorkflowSnapshot,
) -> DeletionPlan {
    let Some(target) = path.block(block_id) else {
        debug!(path = path.id, block = block_id, "block not found, nothing to delete");
        return DeletionPlan::empty(path.id, block_id);
    };
    let cut = target.position;

    let mut trailing: Vec<&Block> = path
        .blocks
        .iter()
        .filter(|b| b.position >= cut && b.kind != BlockKind::Merge)
        .collect();
    trailing.sort_by_key(|b| b.position);

    let mut severed = Severance::default();
    severed.blocks.extend(trailing.iter().map(|b| b.id));
    let mut seeds: Vec<PathId> = trailing.iter().flat_map(|b| b.child_path_ids()).collect();

    let merge_retained = path
        .blocks
        .iter()
        .any(|b| b.position >= cut && b.kind == BlockKind::Merge);
    let new_tail = path
        .blocks
        .iter()
        .filter(|b| b.position < cut)
        .max_by_key(|b| b.position);

    let mut blocks_to_retype = Vec::new();
    if let Some(tail) = new_tail {
        if !merge_retained && tail.kind.is_ordinary() && !trailing.is_empty() {
            for child in tail.child_path_ids() {
                severed.links.insert((tail.id, child));
                seeds.push(child);
            }
            blocks_to_retype.push(Retype {
                block_id: tail.id,
                kind: BlockKind::Last,
                clear_children: true,
            });
        }
    }

    let paths_to_remove = orphaned_paths(seeds, path.id, &severed, snapshot);
    debug!(
        path = path.id,
        block = block_id,
        blocks = trailing.len(),
        paths = paths_to_remove.len(),
        "planned block deletion"
    );

    DeletionPlan {
        path_id: path.id,
        target_block: block_id,
        blocks_to_remove: trailing.iter().map(|b| b.id).collect(),
        paths_to_remove,
        blocks_to_retype,
        links_to_detach: Vec::new(),
    }
}

/// Plans the removal of one sibling branch of a fan-out block.
///
/// The link from `fan_out` to `target` is detached, `target` is removed, and so
/// is every descendant that no surviving parent still feeds. A fan-out block
/// left without any link that is an ordinary block becomes `LAST`.
///
/// Unknown ids, or a block that does not link to `target`, yield an empty plan
/// naming `fan_out`. An unknown fan-out block has no owning path, so its plan
/// carries path id 0.
pub fn plan_branch_removal(
    fan_out: BlockId,
    target: PathId,
    snapshot: &WorkflowSnapshot,
) -> DeletionPlan {
    let Some(owner) = snapshot.block_owner(fan_out) else {
        debug!(block = fan_out, "fan-out block not found, nothing to remove");
        return DeletionPlan::empty(0, fan_out);
    };
    let Some(block) = owner.block(fan_out) else {
        return DeletionPlan::empty(owner.id, fan_out);
    };
    if !block.child_path_ids().any(|id| id == target) {
        debug!(block = fan_out, path = target, "block does not branch into path");
        return DeletionPlan::empty(owner.id, fan_out);
    }

    let mut severed = Severance::default();
    severed.links.insert((fan_out, target));
    let paths_to_remove = orphaned_paths([target], owner.id, &severed, snapshot);

    let mut blocks_to_retype = Vec::new();
    let remaining_links = block.child_path_ids().filter(|id| *id != target).count();
    if remaining_links == 0 && block.kind.is_ordinary() {
        blocks_to_retype.push(Retype {
            block_id: fan_out,
            kind: BlockKind::Last,
            clear_children: true,
        });
    }

    debug!(
        block = fan_out,
        path = target,
        paths = paths_to_remove.len(),
        "planned branch removal"
    );

    DeletionPlan {
        path_id: owner.id,
        target_block: fan_out,
        blocks_to_remove: Vec::new(),
        paths_to_remove,
        blocks_to_retype,
        links_to_detach: vec![DetachLink {
            block_id: fan_out,
            path_id: target,
        }],
    }
}

/// Blocks and individual links that stop feeding their child paths.
#[derive(Default)]
struct Severance {
    blocks: AHashSet<BlockId>,
    links: AHashSet<(BlockId, PathId)>,
}

impl Severance {
    fn cuts(&self, block: BlockId, child: PathId) -> bool {
        self.blocks.contains(&block) || self.links.contains(&(block, child))
    }
}

/// Finds the paths reachable from `seeds` that lose every feeding parent.
///
/// A candidate stays alive when one of its current parent blocks is not
/// severed and is owned by a path that is itself alive: either a path outside
/// the candidate set or a candidate already proven alive. Liveness is grown to
/// a fixed point, so cycles among candidates cannot keep each other alive.
/// Root paths are never removed, and `protected` is never a candidate.
fn orphaned_paths(
    seeds: impl IntoIterator<Item = PathId>,
    protected: PathId,
    severed: &Severance,
    snapshot: &WorkflowSnapshot,
) -> BTreeSet<PathId> {
    let mut candidates = reachable_from_paths(seeds, snapshot);
    candidates.remove(&protected);
    candidates.retain(|id| snapshot.contains_path(*id));
    if candidates.is_empty() {
        return candidates;
    }

    let owners: AHashMap<BlockId, PathId> = snapshot.block_index();
    let mut alive: AHashSet<PathId> = AHashSet::new();

    loop {
        let mut changed = false;
        for id in &candidates {
            if alive.contains(id) {
                continue;
            }
            let Some(path) = snapshot.path(*id) else {
                continue;
            };
            let fed = path.is_root()
                || path.parent_blocks.iter().any(|parent| {
                    if severed.cuts(*parent, *id) {
                        return false;
                    }
                    match owners.get(parent) {
                        Some(owner) => !candidates.contains(owner) || alive.contains(owner),
                        None => false,
                    }
                });
            if fed {
                alive.insert(*id);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    candidates.retain(|id| !alive.contains(id));
    candidates
}
