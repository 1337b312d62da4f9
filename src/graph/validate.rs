use super::model::{BlockId, BlockKind, PathId};
use super::snapshot::WorkflowSnapshot;
use crate::reachability::reachable_from_block;
use std::fmt;

/// A structural problem found in a snapshot.
///
/// None of these stop the planners from running; they degrade gracefully
/// around malformed data. The report exists so callers can surface problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Block positions in a path are not exactly `0..N-1`.
    NonContiguousPositions { path_id: PathId },
    /// A `MERGE` block must continue through exactly one child link.
    MergeChildCount {
        block_id: BlockId,
        child_count: usize,
    },
    DanglingChildLink { block_id: BlockId, target: PathId },
    DanglingParentBlock { path_id: PathId, block_id: BlockId },
    /// A block links to a path that does not list it as a parent.
    UnmirroredChildLink { block_id: BlockId, target: PathId },
    /// A path lists a parent block that does not link back to it.
    UnmirroredParentBlock { path_id: PathId, block_id: BlockId },
    NoRootPath,
    MultipleRootPaths { path_ids: Vec<PathId> },
    /// The path can reach itself through child links.
    Cycle { path_id: PathId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NonContiguousPositions { path_id } => {
                write!(f, "path {} has non-contiguous block positions", path_id)
            }
            Violation::MergeChildCount {
                block_id,
                child_count,
            } => write!(
                f,
                "merge block {} has {} child links, expected exactly 1",
                block_id, child_count
            ),
            Violation::DanglingChildLink { block_id, target } => {
                write!(f, "block {} links to missing path {}", block_id, target)
            }
            Violation::DanglingParentBlock { path_id, block_id } => {
                write!(f, "path {} lists missing parent block {}", path_id, block_id)
            }
            Violation::UnmirroredChildLink { block_id, target } => write!(
                f,
                "block {} links to path {} which does not list it as a parent",
                block_id, target
            ),
            Violation::UnmirroredParentBlock { path_id, block_id } => write!(
                f,
                "path {} lists parent block {} which does not link to it",
                path_id, block_id
            ),
            Violation::NoRootPath => write!(f, "workflow has no root path"),
            Violation::MultipleRootPaths { path_ids } => {
                write!(f, "workflow has {} root paths: {:?}", path_ids.len(), path_ids)
            }
            Violation::Cycle { path_id } => write!(f, "path {} is part of a cycle", path_id),
        }
    }
}

/// The outcome of `validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks a snapshot against the structural invariants of a workflow graph.
pub fn validate(snapshot: &WorkflowSnapshot) -> ValidationReport {
    let mut violations = Vec::new();
    let owners = snapshot.block_index();

    for path in snapshot.paths() {
        if !path.is_contiguous() {
            violations.push(Violation::NonContiguousPositions { path_id: path.id });
        }

        for block in &path.blocks {
            if block.kind == BlockKind::Merge && block.child_paths.len() != 1 {
                violations.push(Violation::MergeChildCount {
                    block_id: block.id,
                    child_count: block.child_paths.len(),
                });
            }
            for target in block.child_path_ids() {
                match snapshot.path(target) {
                    None => violations.push(Violation::DanglingChildLink {
                        block_id: block.id,
                        target,
                    }),
                    Some(child) if !child.parent_blocks.contains(&block.id) => {
                        violations.push(Violation::UnmirroredChildLink {
                            block_id: block.id,
                            target,
                        })
                    }
                    Some(_) => {}
                }
            }
            if reachable_from_block(block, snapshot).contains(&path.id)
                && !violations.contains(&Violation::Cycle { path_id: path.id })
            {
                violations.push(Violation::Cycle { path_id: path.id });
            }
        }

        for &parent in &path.parent_blocks {
            let links_back = owners
                .get(&parent)
                .and_then(|owner| snapshot.path(*owner))
                .and_then(|owner| owner.block(parent))
                .map(|b| b.child_path_ids().any(|id| id == path.id));
            match links_back {
                None => violations.push(Violation::DanglingParentBlock {
                    path_id: path.id,
                    block_id: parent,
                }),
                Some(false) => violations.push(Violation::UnmirroredParentBlock {
                    path_id: path.id,
                    block_id: parent,
                }),
                Some(true) => {}
            }
        }
    }

    let roots: Vec<PathId> = snapshot.roots().iter().map(|p| p.id).collect();
    match roots.len() {
        0 if !snapshot.is_empty() => violations.push(Violation::NoRootPath),
        0 | 1 => {}
        _ => violations.push(Violation::MultipleRootPaths { path_ids: roots }),
    }

    ValidationReport { violations }
}
