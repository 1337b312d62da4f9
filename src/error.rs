use crate::graph::{BlockId, PathId};
use thiserror::Error;

/// Errors that can occur while loading or storing a workflow snapshot.
#[derive(Error, Debug, Clone)]
pub enum SnapshotError {
    #[error("Snapshot JSON error: {0}")]
    Json(String),

    #[error("Path {0} appears more than once in the snapshot")]
    DuplicatePath(PathId),

    #[error("Block {block_id} is owned by both path {first_owner} and path {second_owner}")]
    DuplicateBlock {
        block_id: BlockId,
        first_owner: PathId,
        second_owner: PathId,
    },

    #[error("Binary snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Binary snapshot decoding failed: {0}")]
    Decode(String),

    #[error("Snapshot I/O failed for '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors reported by the persistence collaborator when a mutation is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Remote rejected the mutation: {0}")]
    Rejected(String),

    #[error("Network failure while persisting mutation: {0}")]
    Network(String),
}

/// Errors surfaced by a `WorkflowSession` while applying structural mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Mutation {0} is still awaiting confirmation")]
    MutationInFlight(u64),

    #[error("Mutation {0} is not in flight")]
    UnknownMutation(u64),

    #[error("Mutation {id} was rolled back: {source}")]
    Persistence {
        id: u64,
        #[source]
        source: PersistenceError,
    },
}
