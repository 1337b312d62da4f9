//! Structural planners over a `WorkflowSnapshot`.
//!
//! Planning is pure: every function here reads a snapshot and returns data
//! describing a change. Nothing is mutated until `apply_plan` builds a new
//! snapshot from a plan.

pub mod align;
pub mod apply;
pub mod delete;

pub use align::*;
pub use apply::apply_plan;
pub use delete::*;
