//! Structural guarantees of a condensed tree.
//!
//! - Every surviving split has two branches of at least `min_cluster_size`
//!   points.
//! - Each node's size equals its fallen points plus its children, with a
//!   single-point leaf counting itself.
//! - A node's aggregate scale is the sum of its fallen points' scales.
//! - Every point is reported exactly once across the tree.

use proptest::test_runner::TestCaseResult;

use crate::tree::MergeNode;

use super::types::HierarchyFixture;

pub(super) fn run_structural_property(fixture: &HierarchyFixture) -> TestCaseResult {
    let tree = fixture.condensed()?;
    let min_cluster_size = fixture.min_cluster_size;
    let mut seen = vec![false; tree.point_count()];

    for node in tree.nodes() {
        if let (Some(left), Some(right)) = (node.left(), node.right()) {
            if left.size() < min_cluster_size || right.size() < min_cluster_size {
                return Err(fixture.fail(format!(
                    "node {} kept a branch below the threshold ({} / {})",
                    node.id(),
                    left.size(),
                    right.size(),
                )));
            }
        }
        check_size(fixture, node)?;
        check_aggregate(fixture, node)?;

        let own = (node.is_leaf() && node.size() == 1).then_some(node.id());
        let points = node
            .fallen_points()
            .iter()
            .map(|fallen| fallen.point())
            .chain(own);
        for point in points {
            match seen.get_mut(point) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(fixture.fail(format!("point {point} reported twice"))),
                None => return Err(fixture.fail(format!("point {point} out of range"))),
            }
        }
    }

    if let Some(missing) = seen.iter().position(|reported| !reported) {
        return Err(fixture.fail(format!("point {missing} missing from the condensed tree")));
    }
    Ok(())
}

fn check_size(fixture: &HierarchyFixture, node: &MergeNode) -> TestCaseResult {
    let children: usize = [node.left(), node.right()]
        .into_iter()
        .flatten()
        .map(MergeNode::size)
        .sum();
    let own = usize::from(node.is_leaf() && node.size() == 1);
    let expected = node.fallen_points().len() + children + own;
    if node.size() == expected {
        Ok(())
    } else {
        Err(fixture.fail(format!(
            "node {} has size {} but accounts for {expected} points",
            node.id(),
            node.size(),
        )))
    }
}

fn check_aggregate(fixture: &HierarchyFixture, node: &MergeNode) -> TestCaseResult {
    let sum: f64 = node.fallen_points().iter().map(|fallen| fallen.scale()).sum();
    let tolerance = 1e-9 * sum.abs().max(1.0);
    if (node.aggregate_scale() - sum).abs() <= tolerance {
        Ok(())
    } else {
        Err(fixture.fail(format!(
            "node {} aggregate {} differs from fallen scale sum {sum}",
            node.id(),
            node.aggregate_scale(),
        )))
    }
}
