use crate::graph::{BlockId, BlockKind, ChildLink, PathId, WorkflowSnapshot};
use crate::reachability::reachable_from_block;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Sibling branches of one fan-out block that eventually rejoin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingGroup {
    /// Member path ids, in the order the fan-out block links to them.
    pub members: Vec<PathId>,
}

impl SiblingGroup {
    pub fn contains(&self, path_id: PathId) -> bool {
        self.members.contains(&path_id)
    }

    /// A group with a single member does not converge with anything.
    pub fn is_converging(&self) -> bool {
        self.members.len() > 1
    }
}

/// Groups sibling branch targets whose terminal blocks reach a common path.
///
/// Every pair of siblings is tested for an intersection of the paths reachable
/// from their last blocks, and intersecting pairs are merged transitively.
/// Groups come out in the order of their first member's link; a sibling whose
/// path is missing or empty ends up alone in its own group.
pub fn group_converging_siblings(
    links: &[ChildLink],
    snapshot: &WorkflowSnapshot,
) -> Vec<SiblingGroup> {
    let reach: Vec<BTreeSet<PathId>> = links
        .iter()
        .map(|link| terminal_reach(link.path_id, snapshot))
        .collect();

    let mut sets = DisjointSets::new(links.len());
    for (i, j) in (0..links.len()).tuple_combinations() {
        if !reach[i].is_disjoint(&reach[j]) {
            sets.union(i, j);
        }
    }

    let mut groups: Vec<(usize, SiblingGroup)> = Vec::new();
    for (index, link) in links.iter().enumerate() {
        let root = sets.find(index);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.members.push(link.path_id),
            None => groups.push((
                root,
                SiblingGroup {
                    members: vec![link.path_id],
                },
            )),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

fn terminal_reach(path_id: PathId, snapshot: &WorkflowSnapshot) -> BTreeSet<PathId> {
    snapshot
        .path(path_id)
        .and_then(|path| path.last_block())
        .map(|block| reachable_from_block(block, snapshot))
        .unwrap_or_default()
}

/// Union-find over sibling indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index wins so group roots follow link order.
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}

/// Tuning for merge-length padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Bookkeeping blocks per branch that do not count toward its length.
    pub structural_blocks: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            structural_blocks: 2,
        }
    }
}

/// How many spacers a sibling branch needs to line up with its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPadding {
    pub path_id: PathId,
    pub real_blocks: usize,
    pub spacers: usize,
}

/// Grouping and padding for the sibling branches of one fan-out block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPlan {
    pub fan_out: BlockId,
    pub groups: Vec<SiblingGroup>,
    /// One entry per sibling, in group order.
    pub padding: Vec<BranchPadding>,
}

impl AlignmentPlan {
    pub fn spacers_for(&self, path_id: PathId) -> usize {
        self.padding
            .iter()
            .find(|p| p.path_id == path_id)
            .map_or(0, |p| p.spacers)
    }
}

/// A row in a branch's layout: a real block or a non-persisted spacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutSlot {
    Block(BlockId),
    Spacer {
        /// The trailing `MERGE` block the spacer sits in front of.
        merge_block: BlockId,
        index: usize,
    },
}

impl LayoutSlot {
    pub fn is_spacer(&self) -> bool {
        matches!(self, LayoutSlot::Spacer { .. })
    }
}

/// The padded row sequence for one sibling branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLayout {
    pub path_id: PathId,
    pub slots: Vec<LayoutSlot>,
}

/// Computes sibling grouping and merge-length padding over a snapshot.
pub struct AlignmentPlanner<'a> {
    snapshot: &'a WorkflowSnapshot,
    config: AlignmentConfig,
}

pub struct AlignmentPlannerBuilder<'a> {
    snapshot: &'a WorkflowSnapshot,
    config: AlignmentConfig,
}

impl<'a> AlignmentPlannerBuilder<'a> {
    pub fn new(snapshot: &'a WorkflowSnapshot) -> Self {
        Self {
            snapshot,
            config: AlignmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AlignmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_structural_blocks(mut self, count: usize) -> Self {
        self.config.structural_blocks = count;
        self
    }

    pub fn build(self) -> AlignmentPlanner<'a> {
        AlignmentPlanner {
            snapshot: self.snapshot,
            config: self.config,
        }
    }
}

impl<'a> AlignmentPlanner<'a> {
    pub fn builder(snapshot: &'a WorkflowSnapshot) -> AlignmentPlannerBuilder<'a> {
        AlignmentPlannerBuilder::new(snapshot)
    }

    pub fn config(&self) -> AlignmentConfig {
        self.config
    }

    /// Block count of a branch minus its structural bookkeeping blocks.
    pub fn real_blocks(&self, path_id: PathId) -> usize {
        self.snapshot
            .path(path_id)
            .map_or(0, |p| p.blocks.len().saturating_sub(self.config.structural_blocks))
    }

    /// The path a branch rejoins through its trailing `MERGE` block, if any.
    pub fn merge_target(&self, path_id: PathId) -> Option<PathId> {
        let block = self.snapshot.path(path_id)?.last_block()?;
        match (block.kind, block.child_paths.as_slice()) {
            (BlockKind::Merge, [link]) => Some(link.path_id),
            _ => None,
        }
    }

    /// Groups the fan-out's siblings and pads branches that rejoin at one `MERGE` target.
    ///
    /// Within a converging group, members whose trailing `MERGE` blocks lead
    /// into the same path are padded to the longest of them. Members that
    /// rejoin from an ordinary block, or whose `MERGE` leads elsewhere than
    /// any other member's, get no spacers. An unknown block, or one that is
    /// not a fan-out, gets a plan with one singleton group per link and no
    /// padding.
    pub fn plan(&self, fan_out: BlockId) -> AlignmentPlan {
        let links = self
            .snapshot
            .block(fan_out)
            .map(|b| b.child_paths.clone())
            .unwrap_or_default();
        let groups = group_converging_siblings(&links, self.snapshot);

        let mut padding = Vec::with_capacity(links.len());
        for group in &groups {
            let members: Vec<(PathId, usize, Option<PathId>)> = group
                .members
                .iter()
                .map(|id| (*id, self.real_blocks(*id), self.merge_target(*id)))
                .collect();

            let mut longest: AHashMap<PathId, (usize, usize)> = AHashMap::new();
            for (_, real_blocks, target) in &members {
                if let Some(target) = target {
                    let entry = longest.entry(*target).or_insert((0, 0));
                    entry.0 = entry.0.max(*real_blocks);
                    entry.1 += 1;
                }
            }

            for (path_id, real_blocks, target) in members {
                let spacers = match target.and_then(|t| longest.get(&t)) {
                    Some((max, sharing)) if *sharing > 1 => max - real_blocks,
                    _ => 0,
                };
                padding.push(BranchPadding {
                    path_id,
                    real_blocks,
                    spacers,
                });
            }
        }

        debug!(
            block = fan_out,
            groups = groups.len(),
            spacers = padding.iter().map(|p| p.spacers).sum::<usize>(),
            "planned branch alignment"
        );

        AlignmentPlan {
            fan_out,
            groups,
            padding,
        }
    }

    /// Plans every fan-out block in the snapshot, in path then position order.
    pub fn plan_all(&self) -> Vec<AlignmentPlan> {
        self.snapshot
            .paths()
            .flat_map(|path| path.blocks.iter())
            .filter(|block| block.is_fan_out())
            .map(|block| self.plan(block.id))
            .collect()
    }

    /// Row sequence of a branch with `spacers` placeholders in front of its trailing `MERGE`.
    ///
    /// A branch without a trailing `MERGE` has nothing to align against and
    /// gets its blocks only.
    pub fn layout_slots(&self, path_id: PathId, spacers: usize) -> Vec<LayoutSlot> {
        let Some(path) = self.snapshot.path(path_id) else {
            return Vec::new();
        };
        let mut blocks: Vec<_> = path.blocks.iter().collect();
        blocks.sort_by_key(|b| b.position);

        let Some(merge_block) = blocks
            .last()
            .filter(|b| b.kind == BlockKind::Merge)
            .map(|b| b.id)
        else {
            return blocks.iter().map(|b| LayoutSlot::Block(b.id)).collect();
        };

        let mut slots: Vec<LayoutSlot> = blocks[..blocks.len() - 1]
            .iter()
            .map(|b| LayoutSlot::Block(b.id))
            .collect();
        slots.extend((0..spacers).map(|index| LayoutSlot::Spacer { merge_block, index }));
        slots.push(LayoutSlot::Block(merge_block));
        slots
    }

    /// Padded layouts for every sibling of a plan, converging siblings adjacent.
    pub fn layout(&self, plan: &AlignmentPlan) -> Vec<BranchLayout> {
        plan.padding
            .iter()
            .map(|p| BranchLayout {
                path_id: p.path_id,
                slots: self.layout_slots(p.path_id, p.spacers),
            })
            .collect()
    }
}
