use crate::graph::{PathId, WorkflowSnapshot};
use crate::planner::{AlignmentPlan, BranchLayout, DeletionPlan, LayoutSlot};
use std::collections::BTreeSet;

/// Formats planner output into human-readable text.
pub struct PlanFormatter;

impl PlanFormatter {
    pub fn format_reachable(start: PathId, reachable: &BTreeSet<PathId>) -> String {
        if reachable.is_empty() {
            format!("path {} reaches no other path", start)
        } else {
            format!("path {} reaches {}", start, Self::join_ids(reachable.iter()))
        }
    }

    /// Summary of a deletion plan, naming paths when the snapshot knows them.
    pub fn format_deletion(plan: &DeletionPlan, snapshot: &WorkflowSnapshot) -> String {
        if plan.is_empty() {
            return format!("deleting block {}: nothing to do", plan.target_block);
        }

        let mut lines = vec![format!(
            "deleting block {} in path {}",
            plan.target_block, plan.path_id
        )];
        if !plan.blocks_to_remove.is_empty() {
            lines.push(format!(
                "  remove blocks: {}",
                Self::join_ids(plan.blocks_to_remove.iter())
            ));
        }
        for path_id in &plan.paths_to_remove {
            let name = snapshot.path(*path_id).map_or("?", |p| p.name.as_str());
            lines.push(format!("  remove path {} ({})", path_id, name));
        }
        for retype in &plan.blocks_to_retype {
            lines.push(format!("  retag block {} as {}", retype.block_id, retype.kind));
        }
        for detach in &plan.links_to_detach {
            lines.push(format!(
                "  detach block {} from path {}",
                detach.block_id, detach.path_id
            ));
        }
        lines.join("\n")
    }

    pub fn format_alignment(plan: &AlignmentPlan) -> String {
        let mut lines = vec![format!(
            "fan-out block {}: {} group(s)",
            plan.fan_out,
            plan.groups.len()
        )];
        for group in &plan.groups {
            let members = group
                .members
                .iter()
                .map(|id| format!("{}(+{})", id, plan.spacers_for(*id)))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("  [{}]", members));
        }
        lines.join("\n")
    }

    /// One row per branch: block ids, with `_` for spacers.
    pub fn format_layout(layouts: &[BranchLayout]) -> String {
        layouts
            .iter()
            .map(|layout| {
                let row = layout
                    .slots
                    .iter()
                    .map(|slot| match slot {
                        LayoutSlot::Block(id) => id.to_string(),
                        LayoutSlot::Spacer { .. } => "_".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("  path {}: {}", layout.path_id, row)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn join_ids<'a>(ids: impl Iterator<Item = &'a u64>) -> String {
        ids.map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
    }
}
