//! # Forkline - Branching Workflow Graph Engine
//!
//! **Forkline** models a business process as a graph of **paths** (linear
//! sequences of blocks) connected by **child links** (a block branching into a
//! downstream path). Branches may fan out and later reconverge at a `MERGE`
//! block. The crate holds the algorithms that keep such a graph consistent
//! while users edit it, and that prepare it for a layout solver.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Snapshot**: Parse the persistence layer's JSON into a
//!     `WorkflowSnapshot`, either with `snapshot_from_json` or by implementing
//!     `IntoSnapshot` for your own records.
//! 2.  **Plan**: Ask `plan_block_deletion` / `plan_branch_removal` what a
//!     deletion cascades into, or ask an `AlignmentPlanner` how sibling
//!     branches group and how much padding they need to line up at a merge.
//! 3.  **Apply**: Hand a deletion plan to a `WorkflowSession`. It applies the
//!     plan optimistically, forwards a `MutationRequest` to your
//!     `PersistenceGateway`, and rolls back if the write fails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forkline::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("workflow.json")?;
//!     let snapshot = snapshot_from_json(&json)?;
//!
//!     // Group and pad the siblings of every fan-out block.
//!     let planner = AlignmentPlanner::builder(&snapshot).build();
//!     for plan in planner.plan_all() {
//!         println!("{}", PlanFormatter::format_alignment(&plan));
//!     }
//!
//!     // Delete block 12 of path 3, persisting through a closure.
//!     let mut session = WorkflowSession::new(snapshot);
//!     let mut gateway = |request: &MutationRequest| -> std::result::Result<(), PersistenceError> {
//!         println!("bulk delete {:?}", request.delete_block_ids);
//!         Ok(())
//!     };
//!     let plan = session.delete_block(3, 12, &mut gateway)?;
//!     println!("{}", PlanFormatter::format_deletion(&plan, session.snapshot()));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod graph;
pub mod planner;
pub mod prelude;
pub mod reachability;
pub mod report;
pub mod session;
