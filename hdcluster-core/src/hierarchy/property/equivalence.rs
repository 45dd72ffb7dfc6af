//! Equivalence with the recursive model.
//!
//! After condensing and selecting, the tree must match the model node for
//! node in preorder: same ids, same selection flags, and the same stability
//! and fallen-point scales down to the bit. The stability returned by the
//! selection pass must match as well.

use proptest::test_runner::TestCaseResult;

use crate::{hierarchy::SelectionMode, tree::MergeTree};

use super::{
    oracle::{NodeSnapshot, reference_run},
    types::HierarchyFixture,
};

pub(super) fn run_oracle_equivalence_property(
    fixture: &HierarchyFixture,
    mode: SelectionMode,
) -> TestCaseResult {
    let mut tree = fixture.condensed()?;
    let stability = tree
        .select(fixture.threshold(), mode)
        .map_err(|err| fixture.fail(format!("selection failed: {err}")))?;
    let expected = reference_run(&fixture.script, fixture.min_cluster_size, mode);

    let actual = snapshot(&tree);
    if actual.len() != expected.nodes.len() {
        return Err(fixture.fail(format!(
            "{mode:?}: tree has {} nodes, model has {}",
            actual.len(),
            expected.nodes.len(),
        )));
    }
    if let Some((position, (got, want))) = actual
        .iter()
        .zip(&expected.nodes)
        .enumerate()
        .find(|(_, (got, want))| got != want)
    {
        return Err(fixture.fail(format!(
            "{mode:?}: preorder position {position} differs: tree {got:?}, model {want:?}",
        )));
    }
    if stability.to_bits() != expected.stability {
        return Err(fixture.fail(format!(
            "{mode:?}: returned stability {stability} differs from model {}",
            f64::from_bits(expected.stability),
        )));
    }
    Ok(())
}

fn snapshot(tree: &MergeTree) -> Vec<NodeSnapshot> {
    tree.nodes()
        .map(|node| NodeSnapshot {
            id: node.id(),
            selected: node.is_selected(),
            stability: node.stability().to_bits(),
            fallen: node
                .fallen_points()
                .iter()
                .map(|fallen| (fallen.point(), fallen.scale().to_bits()))
                .collect(),
        })
        .collect()
}
