//! Forked condensation must match the sequential walk exactly.
//!
//! The fork only changes which worker rewrites a subtree, never the order of
//! folds within a node, so scales and fallen-point order must be bitwise
//! identical.

use proptest::test_runner::TestCaseResult;

use crate::{hierarchy::HierarchyConfig, result::HierarchyExport};

use super::types::HierarchyFixture;

pub(super) fn run_fork_determinism_property(fixture: &HierarchyFixture) -> TestCaseResult {
    let sequential = condense_and_export(fixture, usize::MAX)?;
    for cutoff in [0, 2, 16] {
        let forked = condense_and_export(fixture, cutoff)?;
        if forked != sequential {
            return Err(fixture.fail(format!("cutoff {cutoff} changed the condensed hierarchy")));
        }
    }
    Ok(())
}

fn condense_and_export(
    fixture: &HierarchyFixture,
    cutoff: usize,
) -> Result<HierarchyExport, proptest::test_runner::TestCaseError> {
    let mut tree = fixture.tree();
    let config = HierarchyConfig::new(fixture.threshold()).with_sequential_cutoff(cutoff);
    tree.condense_with(&config)
        .map_err(|err| fixture.fail(format!("condense failed at cutoff {cutoff}: {err}")))?;
    tree.select_clusters(fixture.threshold())
        .map_err(|err| fixture.fail(format!("selection failed at cutoff {cutoff}: {err}")))?;
    tree.export_hierarchy()
        .map_err(|err| fixture.fail(format!("export failed at cutoff {cutoff}: {err}")))
}
