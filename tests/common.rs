//! Common test utilities for building workflow snapshots.
use forkline::prelude::*;

/// Builds a path from `(block_id, kind)` pairs, positions assigned in order.
#[allow(dead_code)]
pub fn path(id: PathId, parents: &[BlockId], blocks: &[(BlockId, BlockKind)]) -> Path {
    let mut path = Path::new(id, format!("Path {}", id));
    path.parent_blocks = parents.to_vec();
    for (block_id, kind) in blocks {
        path.push_block(*block_id, *kind);
    }
    path
}

/// Points a block of `path` at the given child paths.
#[allow(dead_code)]
pub fn link(mut path: Path, block_id: BlockId, children: &[PathId]) -> Path {
    if let Some(block) = path.block_mut(block_id) {
        block.child_paths = children.iter().map(|c| ChildLink::new(*c)).collect();
    }
    path
}

#[allow(dead_code)]
pub fn snapshot(paths: Vec<Path>) -> WorkflowSnapshot {
    WorkflowSnapshot::from_paths(paths).expect("fixture paths must be unique")
}

/// A fan-out whose two branches rejoin at a shared merge target.
///
/// ```text
/// 1: BEGIN(10) STEP(11) ─┬─> 2: STEP(20) STEP(21) MERGE(22) ──────────────────┐
///                        └─> 3: STEP(30) STEP(31) DELAY(32) STEP(33) MERGE(34) ┴─> 4: STEP(40) END(41)
/// ```
#[allow(dead_code)]
pub fn converging_workflow() -> WorkflowSnapshot {
    use BlockKind::*;
    snapshot(vec![
        link(path(1, &[], &[(10, Begin), (11, Step)]), 11, &[2, 3]),
        link(
            path(2, &[11], &[(20, Step), (21, Step), (22, Merge)]),
            22,
            &[4],
        ),
        link(
            path(
                3,
                &[11],
                &[(30, Step), (31, Step), (32, Delay), (33, Step), (34, Merge)],
            ),
            34,
            &[4],
        ),
        path(4, &[22, 34], &[(40, Step), (41, End)]),
    ])
}

/// Two branches that jump straight into a shared path from an ordinary block.
///
/// ```text
/// 1: BEGIN(10) STEP(11) ─┬─> 2: STEP(20) STEP(21) ─┐
///                        └─> 3: STEP(30) STEP(31) ─┴─> 4: STEP(40) LAST(41)
/// ```
#[allow(dead_code)]
pub fn jump_workflow() -> WorkflowSnapshot {
    use BlockKind::*;
    snapshot(vec![
        link(path(1, &[], &[(10, Begin), (11, Step)]), 11, &[2, 3]),
        link(path(2, &[11], &[(20, Step), (21, Step)]), 21, &[4]),
        link(path(3, &[11], &[(30, Step), (31, Step)]), 31, &[4]),
        path(4, &[21, 31], &[(40, Step), (41, Last)]),
    ])
}

/// A fan-out whose branches never rejoin.
#[allow(dead_code)]
pub fn diverging_workflow() -> WorkflowSnapshot {
    use BlockKind::*;
    snapshot(vec![
        link(path(1, &[], &[(10, Begin), (11, Step)]), 11, &[2, 3]),
        path(2, &[11], &[(20, Step), (21, End)]),
        path(3, &[11], &[(30, Step), (31, Delay), (32, Step), (33, Last)]),
    ])
}

/// A single path: BEGIN(1) STEP(2) STEP(3) LAST(4).
#[allow(dead_code)]
pub fn linear_workflow() -> WorkflowSnapshot {
    use BlockKind::*;
    snapshot(vec![path(
        1,
        &[],
        &[(1, Begin), (2, Step), (3, Step), (4, Last)],
    )])
}

/// Asserts that every path's positions are exactly `0..N-1`.
#[allow(dead_code)]
pub fn assert_contiguous(snapshot: &WorkflowSnapshot) {
    for path in snapshot.paths() {
        let positions: Vec<usize> = path.blocks.iter().map(|b| b.position).collect();
        let expected: Vec<usize> = (0..path.blocks.len()).collect();
        assert_eq!(positions, expected, "path {} is not contiguous", path.id);
    }
}

/// The persistence-layer JSON for `jump_workflow`, with scrambled positions.
#[allow(dead_code)]
pub const JUMP_WORKFLOW_JSON: &str = r#"[
  { "path": { "id": 1, "name": "Main", "parent_blocks": [],
      "blocks": [
        { "id": 11, "position": 4, "type": "STEP", "title": "Review", "child_paths": [{ "id": 2 }, { "id": 3 }] },
        { "id": 10, "position": 0, "type": "BEGIN" }
      ] } },
  { "path": { "id": 2, "name": "Approved", "parent_blocks": [{ "id": 11 }],
      "blocks": [
        { "id": 20, "position": 0, "type": "STEP" },
        { "id": 21, "position": 1, "type": "STEP", "child_paths": [{ "id": 4 }] }
      ] } },
  { "path": { "id": 3, "name": "Rejected", "parentBlocks": [{ "id": 11 }],
      "blocks": [
        { "id": 30, "position": 0, "type": "DELAY" },
        { "id": 31, "position": 1, "type": "STEP", "childPaths": [{ "id": 4 }] }
      ] } },
  { "path": { "id": 4, "name": "Wrap up", "parent_blocks": [{ "id": 21 }, { "id": 31 }],
      "blocks": [
        { "id": 40, "position": 0, "type": "STEP" },
        { "id": 41, "position": 1, "type": "LAST" }
      ] } }
]"#;
