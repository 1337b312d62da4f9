use super::model::{Block, BlockId, BlockKind, ChildLink, Path, PathId};
use super::snapshot::WorkflowSnapshot;
use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};

/// A single entry of the snapshot returned by the persistence layer.
///
/// The shape is `{ "path": { "id", "name", "blocks": [...], "parent_blocks": [...] } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: PathBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathBody {
    pub id: PathId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
    #[serde(default, alias = "parentBlocks")]
    pub parent_blocks: Vec<IdRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub position: usize,
    #[serde(rename = "type", alias = "kind")]
    pub kind: BlockKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "childPaths")]
    pub child_paths: Vec<IdRef>,
}

/// A bare `{ "id": n }` reference as emitted by the persistence API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdRef {
    pub id: u64,
}

/// A trait for data models that can be converted into a `WorkflowSnapshot`.
///
/// Implement it on whatever structs your persistence layer deserializes into,
/// and the planners can work on the result directly.
pub trait IntoSnapshot {
    /// Consumes the object and converts it into a snapshot.
    fn into_snapshot(self) -> Result<WorkflowSnapshot, SnapshotError>;
}

impl IntoSnapshot for Vec<PathRecord> {
    fn into_snapshot(self) -> Result<WorkflowSnapshot, SnapshotError> {
        let paths = self.into_iter().map(|record| {
            let body = record.path;
            let mut path = Path {
                id: body.id,
                name: body.name,
                blocks: body
                    .blocks
                    .into_iter()
                    .map(|b| Block {
                        id: b.id,
                        position: b.position,
                        kind: b.kind,
                        title: b.title.unwrap_or_default(),
                        child_paths: b
                            .child_paths
                            .into_iter()
                            .map(|c| ChildLink::new(c.id))
                            .collect(),
                    })
                    .collect(),
                parent_blocks: body.parent_blocks.into_iter().map(|p| p.id).collect(),
            };
            // Stored positions may have gaps after remote edits.
            path.renumber();
            path
        });
        WorkflowSnapshot::from_paths(paths)
    }
}

impl From<&Path> for PathRecord {
    fn from(path: &Path) -> Self {
        PathRecord {
            path: PathBody {
                id: path.id,
                name: path.name.clone(),
                blocks: path
                    .blocks
                    .iter()
                    .map(|b| BlockRecord {
                        id: b.id,
                        position: b.position,
                        kind: b.kind,
                        title: (!b.title.is_empty()).then(|| b.title.clone()),
                        child_paths: b
                            .child_paths
                            .iter()
                            .map(|c| IdRef { id: c.path_id })
                            .collect(),
                    })
                    .collect(),
                parent_blocks: path.parent_blocks.iter().map(|id| IdRef { id: *id }).collect(),
            },
        }
    }
}

/// Parses the persistence snapshot JSON into a `WorkflowSnapshot`.
pub fn snapshot_from_json(json: &str) -> Result<WorkflowSnapshot, SnapshotError> {
    let records: Vec<PathRecord> =
        serde_json::from_str(json).map_err(|e| SnapshotError::Json(e.to_string()))?;
    records.into_snapshot()
}

/// Renders a snapshot back into the persistence JSON shape.
pub fn snapshot_to_json(snapshot: &WorkflowSnapshot) -> Result<String, SnapshotError> {
    let records: Vec<PathRecord> = snapshot.paths().map(PathRecord::from).collect();
    serde_json::to_string_pretty(&records).map_err(|e| SnapshotError::Json(e.to_string()))
}
