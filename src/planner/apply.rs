use super::delete::DeletionPlan;
use crate::graph::{BlockId, PathId, WorkflowSnapshot};
use ahash::AHashSet;

/// Applies a deletion plan to a copy of `snapshot` and returns the copy.
///
/// Besides the plan's own instructions, every surviving path drops
/// `parent_blocks` entries that point at deleted blocks or severed links, and
/// every surviving block drops child links into removed paths. Later plans
/// therefore see current parent counts instead of stale ones.
pub fn apply_plan(snapshot: &WorkflowSnapshot, plan: &DeletionPlan) -> WorkflowSnapshot {
    let mut next = snapshot.clone();
    let mut dead_blocks: AHashSet<BlockId> = plan.blocks_to_remove.iter().copied().collect();
    let mut cut_links: AHashSet<(BlockId, PathId)> = AHashSet::new();

    for path_id in &plan.paths_to_remove {
        if let Some(path) = next.remove_path(*path_id) {
            dead_blocks.extend(path.blocks.iter().map(|b| b.id));
        }
    }

    if let Some(path) = next.path_mut(plan.path_id) {
        path.blocks.retain(|b| !dead_blocks.contains(&b.id));
        path.renumber();
    }

    let owners = next.block_index();

    for retype in &plan.blocks_to_retype {
        let Some(block) = owners
            .get(&retype.block_id)
            .and_then(|owner| next.path_mut(*owner))
            .and_then(|path| path.block_mut(retype.block_id))
        else {
            continue;
        };
        let block_id = block.id;
        block.kind = retype.kind;
        if retype.clear_children {
            cut_links.extend(block.child_paths.drain(..).map(|l| (block_id, l.path_id)));
        }
    }

    for detach in &plan.links_to_detach {
        let Some(block) = owners
            .get(&detach.block_id)
            .and_then(|owner| next.path_mut(*owner))
            .and_then(|path| path.block_mut(detach.block_id))
        else {
            continue;
        };
        block.child_paths.retain(|l| l.path_id != detach.path_id);
        cut_links.insert((detach.block_id, detach.path_id));
    }

    for path in next.paths_mut() {
        let path_id = path.id;
        path.parent_blocks
            .retain(|b| !dead_blocks.contains(b) && !cut_links.contains(&(*b, path_id)));
        for block in &mut path.blocks {
            block
                .child_paths
                .retain(|l| !plan.paths_to_remove.contains(&l.path_id));
        }
    }

    next
}
