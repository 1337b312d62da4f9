use super::model::{Block, BlockId, Path, PathId};
use crate::error::SnapshotError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// An in-memory copy of every path in a workflow, indexed by path id.
///
/// Paths are kept in a `BTreeMap` so that every traversal over the snapshot
/// visits them in the same order for the same input. All lookups return
/// `Option`: a missing id is a normal outcome that callers skip over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    paths: BTreeMap<PathId, Path>,
}

impl WorkflowSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot, rejecting duplicate path ids and blocks owned by two paths.
    pub fn from_paths(paths: impl IntoIterator<Item = Path>) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::new();
        let mut owners: AHashMap<BlockId, PathId> = AHashMap::new();

        for path in paths {
            if snapshot.paths.contains_key(&path.id) {
                return Err(SnapshotError::DuplicatePath(path.id));
            }
            for block in &path.blocks {
                if let Some(first_owner) = owners.insert(block.id, path.id) {
                    return Err(SnapshotError::DuplicateBlock {
                        block_id: block.id,
                        first_owner,
                        second_owner: path.id,
                    });
                }
            }
            snapshot.paths.insert(path.id, path);
        }
        Ok(snapshot)
    }

    /// Inserts or replaces a path without ownership checks.
    pub fn insert_path(&mut self, path: Path) -> Option<Path> {
        self.paths.insert(path.id, path)
    }

    pub fn remove_path(&mut self, id: PathId) -> Option<Path> {
        self.paths.remove(&id)
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(&id)
    }

    pub fn path_mut(&mut self, id: PathId) -> Option<&mut Path> {
        self.paths.get_mut(&id)
    }

    pub fn contains_path(&self, id: PathId) -> bool {
        self.paths.contains_key(&id)
    }

    /// Iterates paths in ascending id order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    pub(crate) fn paths_mut(&mut self) -> impl Iterator<Item = &mut Path> {
        self.paths.values_mut()
    }

    pub fn path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The path that owns a block, if any.
    pub fn block_owner(&self, block_id: BlockId) -> Option<&Path> {
        self.paths.values().find(|p| p.block(block_id).is_some())
    }

    pub fn block(&self, block_id: BlockId) -> Option<&Block> {
        self.paths.values().find_map(|p| p.block(block_id))
    }

    /// Maps every block id to the id of its owning path.
    pub fn block_index(&self) -> AHashMap<BlockId, PathId> {
        self.paths
            .values()
            .flat_map(|p| p.blocks.iter().map(move |b| (b.id, p.id)))
            .collect()
    }

    /// Every path with no parent blocks.
    ///
    /// A well-formed workflow has exactly one, but the snapshot does not enforce it.
    pub fn roots(&self) -> Vec<&Path> {
        self.paths.values().filter(|p| p.is_root()).collect()
    }

    /// Total number of blocks across all paths.
    pub fn block_count(&self) -> usize {
        self.paths.values().map(|p| p.blocks.len()).sum()
    }

    /// Serializes the snapshot with the bincode format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard()).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Deserializes a snapshot from a byte slice produced by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Saves the snapshot to a file in the binary format.
    pub fn save(&self, path: &str) -> Result<(), SnapshotError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a snapshot previously written by `save`.
    pub fn from_file(path: &str) -> Result<Self, SnapshotError> {
        let bytes = fs::read(path).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}
