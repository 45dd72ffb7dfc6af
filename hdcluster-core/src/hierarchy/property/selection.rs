//! Selection and export guarantees.
//!
//! - In cluster mode every root-to-leaf path holds exactly one selected node;
//!   in subcluster mode the same holds below the root, which is never
//!   selected.
//! - The reported stability is the sum of the selected nodes' scores.
//! - Selecting twice reproduces the same selection and the same score.
//! - Assignments agree with the exported hierarchy: each point belongs to the
//!   nearest selected ancestor of the node it fell out of.

use proptest::test_runner::TestCaseResult;

use crate::{
    hierarchy::SelectionMode,
    result::HierarchyExport,
    tree::{MergeNode, MergeTree},
};

use super::types::HierarchyFixture;

pub(super) fn run_selection_property(
    fixture: &HierarchyFixture,
    mode: SelectionMode,
) -> TestCaseResult {
    let mut tree = fixture.condensed()?;
    let threshold = fixture.threshold();
    let stability = tree
        .select(threshold, mode)
        .map_err(|err| fixture.fail(format!("selection failed: {err}")))?;

    check_frontier(fixture, &tree, mode)?;

    let selected_sum: f64 = tree
        .nodes()
        .filter(|node| node.is_selected())
        .map(MergeNode::stability)
        .sum();
    if (selected_sum - stability).abs() > 1e-9 * stability.abs().max(1.0) {
        return Err(fixture.fail(format!(
            "reported stability {stability} differs from selected sum {selected_sum}"
        )));
    }

    let selected: Vec<usize> = selected_ids(&tree);
    let again = tree
        .select(threshold, mode)
        .map_err(|err| fixture.fail(format!("reselection failed: {err}")))?;
    if again.to_bits() != stability.to_bits() || selected_ids(&tree) != selected {
        return Err(fixture.fail("reselection changed the result"));
    }
    Ok(())
}

pub(super) fn run_export_agreement_property(fixture: &HierarchyFixture) -> TestCaseResult {
    let mut tree = fixture.condensed()?;
    tree.select_clusters(fixture.threshold())
        .map_err(|err| fixture.fail(format!("selection failed: {err}")))?;
    let assignments = tree
        .extract_assignments()
        .map_err(|err| fixture.fail(format!("assignment failed: {err}")))?;
    let export = tree
        .export_hierarchy()
        .map_err(|err| fixture.fail(format!("export failed: {err}")))?;

    if assignments.len() != tree.point_count() {
        return Err(fixture.fail("assignment count differs from point count"));
    }
    let expected = assignments_from_export(&export);
    for (point, (actual, cluster)) in assignments.iter().zip(expected).enumerate() {
        let scale = export.point_scales().get(point).copied();
        if actual.cluster() != cluster || Some(actual.confidence()) != scale {
            return Err(fixture.fail(format!(
                "point {point}: assignment {actual:?} disagrees with export ({cluster:?}, {scale:?})"
            )));
        }
    }
    Ok(())
}

fn selected_ids(tree: &MergeTree) -> Vec<usize> {
    tree.nodes()
        .filter(|node| node.is_selected())
        .map(MergeNode::id)
        .collect()
}

fn check_frontier(
    fixture: &HierarchyFixture,
    tree: &MergeTree,
    mode: SelectionMode,
) -> TestCaseResult {
    let root = tree.root();
    let starts: Vec<&MergeNode> = match mode {
        SelectionMode::Clusters => vec![root],
        SelectionMode::Subclusters => {
            if root.is_selected() {
                return Err(fixture.fail("subcluster selection picked the root"));
            }
            [root.left(), root.right()].into_iter().flatten().collect()
        }
    };

    let mut pending: Vec<(&MergeNode, usize)> = starts.into_iter().map(|node| (node, 0)).collect();
    while let Some((node, above)) = pending.pop() {
        let depth = above + usize::from(node.is_selected());
        if depth > 1 {
            return Err(fixture.fail(format!("node {} is selected below a cluster", node.id())));
        }
        match (node.left(), node.right()) {
            (Some(left), Some(right)) => {
                pending.push((left, depth));
                pending.push((right, depth));
            }
            _ if depth == 0 => {
                return Err(fixture.fail(format!("leaf {} has no selected ancestor", node.id())));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Recomputes per-point clusters from the export's parent links.
fn assignments_from_export(export: &HierarchyExport) -> Vec<Option<usize>> {
    let nodes = export.nodes();
    let mut cluster_of_node: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
    let mut next = 0;
    for node in nodes {
        let inherited = node
            .parent()
            .and_then(|parent| cluster_of_node.get(parent).copied().flatten());
        let cluster = if node.is_selected() {
            next += 1;
            Some(next - 1)
        } else {
            inherited
        };
        cluster_of_node.push(cluster);
    }
    export
        .point_nodes()
        .iter()
        .map(|&index| cluster_of_node.get(index).copied().flatten())
        .collect()
}
