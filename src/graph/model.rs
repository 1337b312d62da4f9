use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a path, unique within a workflow.
pub type PathId = u64;
/// Identifier of a block, unique within a workflow.
pub type BlockId = u64;

/// The closed set of block kinds a workflow can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockKind {
    /// Entry marker of a path.
    Begin,
    Step,
    Delay,
    /// Rejoin point of converging branches. Continues through exactly one child link.
    Merge,
    End,
    /// The "add next step here" affordance at the tail of an open path.
    Last,
}

impl BlockKind {
    /// `END` and `LAST` close a path.
    pub fn is_terminal(self) -> bool {
        matches!(self, BlockKind::End | BlockKind::Last)
    }

    /// Ordinary work items that may sit anywhere in the middle of a path.
    pub fn is_ordinary(self) -> bool {
        matches!(self, BlockKind::Step | BlockKind::Delay)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Begin => "BEGIN",
            BlockKind::Step => "STEP",
            BlockKind::Delay => "DELAY",
            BlockKind::Merge => "MERGE",
            BlockKind::End => "END",
            BlockKind::Last => "LAST",
        };
        f.write_str(name)
    }
}

/// A reference from a block to a downstream path it branches into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildLink {
    pub path_id: PathId,
}

impl ChildLink {
    pub fn new(path_id: PathId) -> Self {
        Self { path_id }
    }
}

/// A single node within a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Zero-based ordinal within the owning path.
    pub position: usize,
    pub kind: BlockKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub child_paths: Vec<ChildLink>,
}

impl Block {
    pub fn new(id: BlockId, position: usize, kind: BlockKind) -> Self {
        Self {
            id,
            position,
            kind,
            title: String::new(),
            child_paths: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = PathId>) -> Self {
        self.child_paths = children.into_iter().map(ChildLink::new).collect();
        self
    }

    /// A block with more than one child link branches into sibling paths.
    pub fn is_fan_out(&self) -> bool {
        self.child_paths.len() > 1
    }

    pub fn child_path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.child_paths.iter().map(|link| link.path_id)
    }
}

/// One linear branch of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,
    pub name: String,
    /// Blocks ordered by position.
    pub blocks: Vec<Block>,
    /// Blocks whose branching caused this path to exist.
    #[serde(default)]
    pub parent_blocks: Vec<BlockId>,
}

impl Path {
    pub fn new(id: PathId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            blocks: Vec::new(),
            parent_blocks: Vec::new(),
        }
    }

    /// Appends a block at the next free position.
    pub fn push_block(&mut self, id: BlockId, kind: BlockKind) -> &mut Block {
        let position = self.blocks.len();
        self.blocks.push(Block::new(id, position, kind));
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    pub fn is_root(&self) -> bool {
        self.parent_blocks.is_empty()
    }

    /// A path fed by more than one parent block.
    pub fn is_convergence(&self) -> bool {
        self.parent_blocks.len() > 1
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn block_at(&self, position: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.position == position)
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.iter().max_by_key(|b| b.position)
    }

    /// Sorts blocks by their stored position and rewrites positions as `0..N-1`.
    /// The relative order of blocks is preserved.
    pub fn renumber(&mut self) {
        self.blocks.sort_by_key(|b| b.position);
        for (position, block) in self.blocks.iter_mut().enumerate() {
            block.position = position;
        }
    }

    /// True when block positions are exactly `0..N-1`.
    pub fn is_contiguous(&self) -> bool {
        let mut positions: Vec<usize> = self.blocks.iter().map(|b| b.position).collect();
        positions.sort_unstable();
        positions.iter().enumerate().all(|(i, p)| i == *p)
    }
}
