//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the
//! forkline crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use forkline::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let snapshot = WorkflowSnapshot::from_file("workflow.bin")?;
//! let root = snapshot.roots()[0].id;
//! println!("{:?}", reachable_paths(root, &snapshot));
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    Block, BlockId, BlockKind, ChildLink, IntoSnapshot, Path, PathId, PathRecord,
    ValidationReport, Violation, WorkflowSnapshot, snapshot_from_json, snapshot_to_json,
    validate,
};

// Traversal and planning
pub use crate::planner::{
    AlignmentConfig, AlignmentPlan, AlignmentPlanner, BranchLayout, BranchPadding,
    DeletionPlan, DetachLink, LayoutSlot, Retype, SiblingGroup, apply_plan,
    group_converging_siblings, plan_block_deletion, plan_branch_removal,
};
pub use crate::reachability::{reachable_from_block, reachable_paths};

// Mutation session
pub use crate::session::{MutationRequest, PendingMutation, PersistenceGateway, WorkflowSession};

// Error types
pub use crate::error::{PersistenceError, SessionError, SnapshotError};

// Plan formatting
pub use crate::report::PlanFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
