//! Shared test utilities for `hdcluster-core`.

use hdcluster_test_support::{dendrograms::Dendrogram, pbt::PbtProfile};
use proptest::test_runner::Config as ProptestConfig;

use crate::tree::{LinkageMerge, MergeTree};

/// Builds a proptest configuration from the shared `PROGTEST_CASES` and
/// `HDCLUSTER_PBT_FORK` profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = PbtProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Converts a scripted dendrogram into linkage merges.
pub(crate) fn linkage(script: &Dendrogram) -> Vec<LinkageMerge> {
    script
        .merges
        .iter()
        .map(|merge| LinkageMerge::new(merge.left, merge.right, merge.distance))
        .collect()
}

/// Builds the merge tree described by `script`.
pub(crate) fn tree_from(script: &Dendrogram) -> MergeTree {
    MergeTree::from_merges(script.point_count, &linkage(script))
        .expect("scripted dendrograms are well formed")
}

/// Asserts two scales agree up to rounding.
#[track_caller]
pub(crate) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}
