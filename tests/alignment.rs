//! Tests for sibling grouping, merge padding and padded layouts.
mod common;
use common::*;
use forkline::prelude::*;

#[cfg(test)]
mod alignment_tests {
    use super::*;

    fn links(ids: &[PathId]) -> Vec<ChildLink> {
        ids.iter().map(|id| ChildLink::new(*id)).collect()
    }

    /// Three siblings where 5 and 7 only meet through 6.
    ///
    /// ```text
    /// 5 ─MERGE─> 8
    /// 6 ─fan-out─> 8, 9
    /// 7 ─MERGE─> 9
    /// ```
    fn chained_workflow() -> WorkflowSnapshot {
        use BlockKind::*;
        snapshot(vec![
            link(path(1, &[], &[(10, Begin), (11, Step)]), 11, &[5, 6, 7]),
            link(
                path(5, &[11], &[(50, Step), (51, Step), (52, Step), (53, Merge)]),
                53,
                &[8],
            ),
            link(path(6, &[11], &[(60, Step), (61, Step)]), 61, &[8, 9]),
            link(path(7, &[11], &[(70, Step), (71, Merge)]), 71, &[9]),
            path(8, &[53, 61], &[(80, End)]),
            path(9, &[61, 71], &[(90, End)]),
        ])
    }

    /// Uneven branches that jump into a shared path from ordinary blocks.
    ///
    /// ```text
    /// 1: BEGIN(10) STEP(11) ─┬─> 2: STEP(20..23) ─┐
    ///                        └─> 3: STEP(30, 31) ─┴─> 4: STEP(40) LAST(41)
    /// ```
    fn uneven_jump_workflow() -> WorkflowSnapshot {
        use BlockKind::*;
        snapshot(vec![
            link(path(1, &[], &[(10, Begin), (11, Step)]), 11, &[2, 3]),
            link(
                path(2, &[11], &[(20, Step), (21, Step), (22, Step), (23, Step)]),
                23,
                &[4],
            ),
            link(path(3, &[11], &[(30, Step), (31, Step)]), 31, &[4]),
            path(4, &[23, 31], &[(40, Step), (41, Last)]),
        ])
    }

    #[test]
    fn test_converging_siblings_form_one_group() {
        let snapshot = converging_workflow();
        let groups = group_converging_siblings(&links(&[2, 3]), &snapshot);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![2, 3]);
        assert!(groups[0].is_converging());
    }

    #[test]
    fn test_diverging_siblings_stay_apart() {
        let snapshot = diverging_workflow();
        let groups = group_converging_siblings(&links(&[2, 3]), &snapshot);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| !g.is_converging()));
    }

    #[test]
    fn test_grouping_is_transitive() {
        let snapshot = chained_workflow();
        let groups = group_converging_siblings(&links(&[5, 6, 7]), &snapshot);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![5, 6, 7]);

        // Without the bridging sibling, 5 and 7 never meet.
        let split = group_converging_siblings(&links(&[5, 7]), &snapshot);
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_grouping_is_symmetric() {
        let snapshot = chained_workflow();
        let forward = group_converging_siblings(&links(&[5, 6, 7]), &snapshot);
        let backward = group_converging_siblings(&links(&[7, 6, 5]), &snapshot);

        let partition = |groups: &[SiblingGroup]| {
            let mut sets: Vec<Vec<PathId>> = groups
                .iter()
                .map(|g| {
                    let mut members = g.members.clone();
                    members.sort_unstable();
                    members
                })
                .collect();
            sets.sort();
            sets
        };
        assert_eq!(partition(&forward), partition(&backward));

        for (a, b) in [(5, 6), (6, 7), (5, 7)] {
            let ab = group_converging_siblings(&links(&[a, b]), &snapshot);
            let ba = group_converging_siblings(&links(&[b, a]), &snapshot);
            assert_eq!(ab.len(), ba.len());
        }
    }

    #[test]
    fn test_missing_sibling_gets_its_own_group() {
        let snapshot = converging_workflow();
        let groups = group_converging_siblings(&links(&[2, 42, 3]), &snapshot);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![2, 3]);
        assert_eq!(groups[1].members, vec![42]);
    }

    #[test]
    fn test_shorter_branch_is_padded_to_longest() {
        let snapshot = converging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let plan = planner.plan(11);

        assert_eq!(plan.fan_out, 11);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.spacers_for(2), 2);
        assert_eq!(plan.spacers_for(3), 0);
    }

    #[test]
    fn test_padding_balances_branches_sharing_a_merge_target() {
        let snapshot = converging_workflow();
        for structural_blocks in 0..4 {
            let planner = AlignmentPlanner::builder(&snapshot)
                .with_structural_blocks(structural_blocks)
                .build();
            let plan = planner.plan(11);
            let totals: Vec<usize> = plan
                .padding
                .iter()
                .filter(|p| planner.merge_target(p.path_id) == Some(4))
                .map(|p| p.real_blocks + p.spacers)
                .collect();
            assert_eq!(totals.len(), 2);
            let longest = planner.real_blocks(2).max(planner.real_blocks(3));
            assert!(totals.iter().all(|t| *t == longest));
        }
    }

    #[test]
    fn test_merge_target_follows_trailing_merge_only() {
        let snapshot = chained_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        assert_eq!(planner.merge_target(5), Some(8));
        assert_eq!(planner.merge_target(7), Some(9));
        assert_eq!(planner.merge_target(6), None);
        assert_eq!(planner.merge_target(42), None);
    }

    #[test]
    fn test_siblings_rejoining_from_ordinary_blocks_get_no_padding() {
        let snapshot = uneven_jump_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let plan = planner.plan(11);

        assert_eq!(plan.groups.len(), 1);
        assert!(plan.groups[0].is_converging());
        assert_eq!(plan.spacers_for(2), 0);
        assert_eq!(plan.spacers_for(3), 0);

        let layouts = planner.layout(&plan);
        assert!(layouts.iter().all(|l| l.slots.iter().all(|s| !s.is_spacer())));
        assert_eq!(
            layouts[1].slots,
            vec![LayoutSlot::Block(30), LayoutSlot::Block(31)]
        );
    }

    #[test]
    fn test_chained_group_pads_nothing_without_shared_merge() {
        let snapshot = chained_workflow();
        let planner = AlignmentPlanner::builder(&snapshot)
            .with_structural_blocks(0)
            .build();
        let plan = planner.plan(11);

        // One group through the bridge, but 5 and 7 merge into different paths.
        assert_eq!(plan.groups.len(), 1);
        assert!(plan.padding.iter().all(|p| p.spacers == 0));
    }

    #[test]
    fn test_structural_block_count_saturates() {
        let snapshot = converging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot)
            .with_config(AlignmentConfig {
                structural_blocks: 10,
            })
            .build();
        assert_eq!(planner.real_blocks(2), 0);
        assert_eq!(planner.plan(11).spacers_for(2), 0);
    }

    #[test]
    fn test_diverging_siblings_get_no_padding() {
        let snapshot = diverging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let plan = planner.plan(11);
        assert!(plan.padding.iter().all(|p| p.spacers == 0));
    }

    #[test]
    fn test_non_fan_out_block_degrades_gracefully() {
        let snapshot = converging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();

        let unknown = planner.plan(999);
        assert!(unknown.groups.is_empty());
        assert!(unknown.padding.is_empty());

        let merge = planner.plan(22);
        assert_eq!(merge.groups.len(), 1);
        assert_eq!(merge.spacers_for(4), 0);
    }

    #[test]
    fn test_plan_all_visits_every_fan_out() {
        let snapshot = chained_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let fan_outs: Vec<BlockId> = planner.plan_all().iter().map(|p| p.fan_out).collect();
        assert_eq!(fan_outs, vec![11, 61]);
    }

    #[test]
    fn test_spacers_sit_before_merge_block() {
        let snapshot = converging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let slots = planner.layout_slots(2, 2);
        assert_eq!(
            slots,
            vec![
                LayoutSlot::Block(20),
                LayoutSlot::Block(21),
                LayoutSlot::Spacer {
                    merge_block: 22,
                    index: 0,
                },
                LayoutSlot::Spacer {
                    merge_block: 22,
                    index: 1,
                },
                LayoutSlot::Block(22),
            ]
        );
    }

    #[test]
    fn test_branch_without_merge_tail_lays_out_blocks_only() {
        let snapshot = diverging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let slots = planner.layout_slots(2, 1);
        assert_eq!(slots, vec![LayoutSlot::Block(20), LayoutSlot::Block(21)]);
        assert!(planner.layout_slots(42, 3).is_empty());
    }

    #[test]
    fn test_padded_layouts_have_equal_rows() {
        let snapshot = converging_workflow();
        let planner = AlignmentPlanner::builder(&snapshot).build();
        let plan = planner.plan(11);
        let layouts = planner.layout(&plan);

        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].slots.len(), layouts[1].slots.len());
        assert_eq!(layouts[0].slots.iter().filter(|s| s.is_spacer()).count(), 2);
    }
}
